mod record;
mod partitioner;
mod config;
mod producer;
mod builder;

pub use self::record::{ProducerRecord, RecordMetadata};
pub use self::partitioner::{DefaultPartitioner, Partitioner};
pub use self::config::{DEFAULT_ACK_TIMEOUT_MILLIS, ProducerBuilder as ProducerConfigBuilder,
                       ProducerConfig};
pub use self::producer::KafkaProducer;
pub use self::builder::ProducerBuilder;
