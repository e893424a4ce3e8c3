#![recursion_limit="128"]

#![cfg_attr(feature="clippy", feature(plugin))]
#![cfg_attr(feature="clippy", plugin(clippy))]

#![allow(dead_code)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;
extern crate bytes;
#[macro_use]
extern crate nom;
extern crate crc;
extern crate time;
extern crate serde;

extern crate futures;
extern crate tokio_core;
extern crate tokio_io;

#[cfg(feature = "gzip")]
extern crate flate2;
#[cfg(feature = "snappy")]
extern crate snap;

#[cfg(test)]
extern crate pretty_env_logger;

#[macro_use]
pub mod errors;
mod compression;
#[macro_use]
mod protocol;
mod network;
mod client;
mod producer;
mod consumer;
mod serialization;

pub mod consts {
    pub use client::{DEFAULT_CLIENT_ID, DEFAULT_MAX_CONNECTION_IDLE_TIMEOUT_MILLIS,
                     DEFAULT_MAX_RESPONSE_SIZE, DEFAULT_METADATA_MAX_AGE_MILLS, DEFAULT_QUEUE_LEN,
                     DEFAULT_REQUEST_TIMEOUT_MILLS};
    pub use producer::DEFAULT_ACK_TIMEOUT_MILLIS;
    pub use consumer::{DEFAULT_MAX_FETCH_BYTES, DEFAULT_MAX_WAIT_MILLIS, DEFAULT_MIN_FETCH_BYTES,
                       DEFAULT_OFFSET_RETENTION_MILLIS};
}

pub use errors::{Error, ErrorKind, KafkaCode, MultiError};
pub use compression::Compression;
pub use protocol::{ApiKeys, FetchOffset, Message, MessageSet, MessageTimestamp, NodeId, Offset,
                   PartitionId, RequiredAcks, Timestamp};
pub use network::{BrokerClient, BrokerPool, ConnectionConfig};
pub use client::{Broker, Cluster, ClientBuilder, ClientConfig, KafkaClient, KafkaVersion,
                 StaticBoxFuture};
pub use producer::{DefaultPartitioner, KafkaProducer, Partitioner, ProducerBuilder,
                   ProducerConfig, ProducerRecord, RecordMetadata};
pub use consumer::{ConsumerBuilder, ConsumerConfig, KafkaConsumer};
pub use serialization::{BytesSerializer, Deserializer, NoopSerializer, RawSerializer, Serializer,
                        StringSerializer};
