//! Wire-level transport: per-broker pipelined connections, a lazy-dial
//! wrapper around them, and a pool keyed by broker node id.
//!
//! Nothing here knows about topics, partitions or consumer groups; that
//! semantic layer lives in `client` and routes through a `BrokerPool`.

mod request;
mod connection;
mod client;
mod pool;

pub use self::request::{KafkaRequest, KafkaResponse, ResponseDecoder, response_decoder};
pub use self::connection::{Connection, ConnectionConfig, Job, DEFAULT_MAX_RESPONSE_SIZE,
                            DEFAULT_QUEUE_LEN, DEFAULT_REQUEST_TIMEOUT_MILLIS};
pub use self::client::BrokerClient;
pub use self::pool::BrokerPool;
