use futures::Future;
use futures::future;

use errors::{ErrorKind, KafkaCode};
use protocol::{Message, MessageSet, PartitionId};
use client::{KafkaClient, StaticBoxFuture};
use producer::{DefaultPartitioner, Partitioner, ProducerConfig, ProducerRecord, RecordMetadata};

/// Produces records one at a time through a `KafkaClient`, resolving the
/// destination partition via a `Partitioner` when the caller doesn't
/// name one explicitly.
#[derive(Clone)]
pub struct KafkaProducer<P = DefaultPartitioner> {
    client: KafkaClient,
    config: ProducerConfig,
    partitioner: P,
}

impl KafkaProducer<DefaultPartitioner> {
    pub fn new(client: KafkaClient, config: ProducerConfig) -> Self {
        KafkaProducer::with_partitioner(client, config, DefaultPartitioner::new())
    }
}

impl<P> KafkaProducer<P>
    where P: Partitioner + Clone + 'static
{
    pub fn with_partitioner(client: KafkaClient, config: ProducerConfig, partitioner: P) -> Self {
        KafkaProducer {
            client: client,
            config: config,
            partitioner: partitioner,
        }
    }

    /// Sends `record`, picking a partition via the configured
    /// `Partitioner` if `record.partition` is unset.
    pub fn send(&self, record: ProducerRecord) -> StaticBoxFuture<RecordMetadata> {
        let client = self.client.clone();
        let config = self.config.clone();
        let topic = record.topic.clone();

        let partition: StaticBoxFuture<PartitionId> = match record.partition {
            Some(partition) => Box::new(future::ok(partition)),
            None => {
                let key = record.key.clone();
                let partitioner = self.partitioner.clone();

                Box::new(self.client.partitions(&topic).and_then(move |partitions| {
                    match partitioner.partition(key.as_ref().map(|b| b.as_ref()), &partitions) {
                        Some(partition) => Ok(partition),
                        None => {
                            Err(ErrorKind::KafkaError(KafkaCode::UnknownTopicOrPartition).into())
                        }
                    }
                }))
            }
        };

        let message = Message {
            offset: 0,
            timestamp: record.timestamp,
            compression: config.compression,
            key: record.key,
            value: record.value,
        };

        Box::new(partition.and_then(move |partition| {
            let message_set = MessageSet { messages: vec![message] };

            client.produce(&topic, partition, message_set, config.required_acks, config.ack_timeout)
                .map(move |offset| {
                    RecordMetadata {
                        topic: topic,
                        partition: partition,
                        offset: offset,
                    }
                })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_partition_skips_partitioner_lookup() {
        use std::net::SocketAddr;
        use tokio_core::reactor::Core;
        use client::ClientConfig;
        use bytes::Bytes;

        let core = Core::new().unwrap();
        let client_config = ClientConfig::builder(vec!["127.0.0.1:9092".parse::<SocketAddr>()
                                                            .unwrap()])
            .build();
        let client = KafkaClient::new(core.handle(), client_config);
        let producer = KafkaProducer::new(client, ProducerConfig::default());

        let record = ProducerRecord::new("my-topic".to_owned(), Bytes::from(&b"value"[..]))
            .with_partition(3);

        // constructing the future must not need to talk to a broker when the
        // partition is already known.
        let _ = producer.send(record);
    }
}
