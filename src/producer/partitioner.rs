use std::cell::Cell;

use crc::crc32;

use protocol::PartitionId;

/// Chooses the partition a record with no explicit partition lands on.
pub trait Partitioner {
    fn partition(&self, key: Option<&[u8]>, partitions: &[PartitionId]) -> Option<PartitionId>;
}

/// Hashes the key with the same CRC-32 used to checksum message bodies
/// when one is present, round-robins across partitions otherwise. This
/// mirrors the reference Java client's default partitioner (`murmur2` in
/// the original; `crc32` here, since that is the checksum this crate
/// already carries for message validation and this client makes no
/// promise of cross-client partition-assignment compatibility).
pub struct DefaultPartitioner {
    counter: Cell<u32>,
}

impl DefaultPartitioner {
    pub fn new() -> Self {
        DefaultPartitioner { counter: Cell::new(0) }
    }
}

impl Default for DefaultPartitioner {
    fn default() -> Self {
        DefaultPartitioner::new()
    }
}

impl Partitioner for DefaultPartitioner {
    fn partition(&self, key: Option<&[u8]>, partitions: &[PartitionId]) -> Option<PartitionId> {
        if partitions.is_empty() {
            return None;
        }

        let idx = match key {
            Some(key) if !key.is_empty() => crc32::checksum_ieee(key) as usize % partitions.len(),
            _ => {
                let n = self.counter.get();
                self.counter.set(n.wrapping_add(1));
                n as usize % partitions.len()
            }
        };

        Some(partitions[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_partition_is_stable() {
        let partitioner = DefaultPartitioner::new();
        let partitions = vec![0, 1, 2, 3];

        let a = partitioner.partition(Some(b"my-key"), &partitions);
        let b = partitioner.partition(Some(b"my-key"), &partitions);

        assert_eq!(a, b);
        assert!(a.is_some());
    }

    #[test]
    fn test_unkeyed_partition_round_robins() {
        let partitioner = DefaultPartitioner::new();
        let partitions = vec![0, 1, 2];

        let a = partitioner.partition(None, &partitions).unwrap();
        let b = partitioner.partition(None, &partitions).unwrap();
        let c = partitioner.partition(None, &partitions).unwrap();
        let d = partitioner.partition(None, &partitions).unwrap();

        assert_eq!(vec![a, b, c, d], vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_empty_partitions_yields_none() {
        let partitioner = DefaultPartitioner::new();
        assert_eq!(partitioner.partition(Some(b"key"), &[]), None);
    }
}
