mod config;
mod consumer;
mod builder;

pub use self::config::{ConsumerConfig, DEFAULT_MAX_FETCH_BYTES, DEFAULT_MAX_WAIT_MILLIS,
                       DEFAULT_MIN_FETCH_BYTES, DEFAULT_OFFSET_RETENTION_MILLIS};
pub use self::consumer::KafkaConsumer;
pub use self::builder::ConsumerBuilder;
