mod version;
mod config;
mod cluster;
mod client;

pub use self::version::KafkaVersion;
pub use self::config::{ClientBuilder, ClientConfig, DEFAULT_CLIENT_ID,
                       DEFAULT_MAX_CONNECTION_IDLE_TIMEOUT_MILLIS, DEFAULT_MAX_RESPONSE_SIZE,
                       DEFAULT_METADATA_MAX_AGE_MILLS, DEFAULT_QUEUE_LEN,
                       DEFAULT_REQUEST_TIMEOUT_MILLS};
pub use self::cluster::Cluster;
pub use self::client::{Broker, KafkaClient, StaticBoxFuture};
