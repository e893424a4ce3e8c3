use protocol::{FetchOffset, Message, Offset, PartitionId};
use client::{KafkaClient, StaticBoxFuture};
use consumer::ConsumerConfig;

/// Polls one or more partitions by hand, committing and fetching offsets
/// through its group's coordinator. This wraps `KafkaClient` rather than
/// adding a second connection layer: every call is a thin, stateless
/// pass-through that supplies the consumer group id and fetch tuning
/// configured at construction.
///
/// There is no subscription list, no partition assignment, and no
/// rebalance protocol here: the caller decides which partitions to poll,
/// exactly as the `Fetch`/`OffsetCommit`/`OffsetFetch` wire operations
/// require one to.
#[derive(Clone)]
pub struct KafkaConsumer {
    client: KafkaClient,
    config: ConsumerConfig,
}

impl KafkaConsumer {
    pub fn new(client: KafkaClient, config: ConsumerConfig) -> Self {
        KafkaConsumer {
            client: client,
            config: config,
        }
    }

    pub fn group_id(&self) -> &str {
        &self.config.group_id
    }

    /// Fetches messages from `(topic, partition)` starting at `offset`.
    pub fn fetch(&self,
                topic: &str,
                partition: PartitionId,
                offset: Offset)
                -> StaticBoxFuture<Vec<Message>> {
        self.client.fetch(topic,
                          partition,
                          offset,
                          self.config.min_fetch_bytes,
                          self.config.max_fetch_bytes,
                          self.config.max_wait)
    }

    /// Resolves the starting offset to fetch from, for callers that have
    /// no previously committed position: `Earliest` or `Latest` per
    /// `FetchOffset`.
    pub fn offsets(&self,
                   topic: &str,
                   partition: PartitionId,
                   offset: FetchOffset)
                   -> StaticBoxFuture<Vec<Offset>> {
        self.client.list_offsets(topic, partition, offset)
    }

    /// Commits `offset` for `(topic, partition)` under this consumer's
    /// group.
    pub fn commit_offset(&self,
                         topic: &str,
                         partition: PartitionId,
                         offset: Offset)
                         -> StaticBoxFuture<()> {
        self.client.commit_offset(&self.config.group_id,
                                  topic,
                                  partition,
                                  offset,
                                  self.config.offset_retention)
    }

    /// Fetches the last committed offset for `(topic, partition)` under
    /// this consumer's group.
    pub fn fetch_offset(&self, topic: &str, partition: PartitionId) -> StaticBoxFuture<Offset> {
        self.client.fetch_offset(&self.config.group_id, topic, partition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_id() {
        use std::net::SocketAddr;
        use tokio_core::reactor::Core;
        use client::ClientConfig;

        let core = Core::new().unwrap();
        let config = ClientConfig::builder(vec!["127.0.0.1:9092".parse::<SocketAddr>().unwrap()])
            .build();
        let client = KafkaClient::new(core.handle(), config);
        let consumer_config = ConsumerConfig::builder("my-group".to_owned()).build();
        let consumer = KafkaConsumer::new(client, consumer_config);

        assert_eq!(consumer.group_id(), "my-group");
    }
}
