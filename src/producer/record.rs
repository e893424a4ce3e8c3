use bytes::Bytes;

use protocol::{MessageTimestamp, Offset, PartitionId};

/// A record to be produced to a single topic and, optionally, a specific
/// partition; if `partition` is `None`, the caller's `Partitioner` picks
/// one.
#[derive(Clone, Debug, PartialEq)]
pub struct ProducerRecord {
    pub topic: String,
    pub partition: Option<PartitionId>,
    pub timestamp: Option<MessageTimestamp>,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
}

impl ProducerRecord {
    pub fn new(topic: String, value: Bytes) -> Self {
        ProducerRecord {
            topic: topic,
            partition: None,
            timestamp: None,
            key: None,
            value: Some(value),
        }
    }

    pub fn with_key(mut self, key: Bytes) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_partition(mut self, partition: PartitionId) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_timestamp(mut self, timestamp: MessageTimestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Result of a successful `KafkaProducer::send`: the partition the
/// broker accepted the record on and the offset it was assigned, or
/// `None` for the latter when the producer was configured with
/// `RequiredAcks::None`.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordMetadata {
    pub topic: String,
    pub partition: PartitionId,
    pub offset: Option<Offset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = ProducerRecord::new("my-topic".to_owned(), Bytes::from(&b"value"[..]))
            .with_key(Bytes::from(&b"key"[..]))
            .with_partition(2);

        assert_eq!(record.topic, "my-topic");
        assert_eq!(record.partition, Some(2));
        assert_eq!(record.key, Some(Bytes::from(&b"key"[..])));
        assert_eq!(record.value, Some(Bytes::from(&b"value"[..])));
    }
}
