use std::net::SocketAddr;

/// Maximum age, in milliseconds, a cached topic/partition/coordinator
/// entry is trusted before a caller-triggered refresh is warranted. The
/// router itself does not time out entries; callers evict explicitly
/// via `LeaderIsDown`/`CoordinatorIsDown` on a protocol error. This
/// constant exists for API parity with the teacher crate's
/// `ClientConfig` and is surfaced for callers who want to poll.
pub const DEFAULT_METADATA_MAX_AGE_MILLS: u64 = 5 * 60 * 1000;
pub const DEFAULT_REQUEST_TIMEOUT_MILLS: u64 = 30_000;
pub const DEFAULT_MAX_CONNECTION_IDLE_TIMEOUT_MILLIS: u64 = 5 * 60 * 1000;
pub const DEFAULT_QUEUE_LEN: usize = 1000;
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 100 * 1024 * 1024;
pub const DEFAULT_CLIENT_ID: &'static str = "kafka-rust-client";

/// Frozen configuration for a `KafkaClient`, built via `ClientBuilder`.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub hosts: Vec<SocketAddr>,
    pub client_id: String,
    pub request_timeout_ms: u64,
    pub queue_len: usize,
    pub max_response_size: usize,
    pub metadata_max_age_ms: u64,
}

impl ClientConfig {
    pub fn builder(hosts: Vec<SocketAddr>) -> ClientBuilder {
        ClientBuilder::from_hosts(hosts)
    }
}

/// Builds a `ClientConfig` from a set of seed broker addresses, filling
/// in defaults for anything not explicitly overridden.
#[derive(Clone, Debug)]
pub struct ClientBuilder {
    hosts: Vec<SocketAddr>,
    client_id: String,
    request_timeout_ms: u64,
    queue_len: usize,
    max_response_size: usize,
    metadata_max_age_ms: u64,
}

impl ClientBuilder {
    pub fn from_hosts(hosts: Vec<SocketAddr>) -> Self {
        ClientBuilder {
            hosts: hosts,
            client_id: DEFAULT_CLIENT_ID.to_owned(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MILLS,
            queue_len: DEFAULT_QUEUE_LEN,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            metadata_max_age_ms: DEFAULT_METADATA_MAX_AGE_MILLS,
        }
    }

    pub fn with_client_id(mut self, client_id: String) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn with_request_timeout(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_queue_len(mut self, queue_len: usize) -> Self {
        self.queue_len = queue_len;
        self
    }

    pub fn with_max_response_size(mut self, max_response_size: usize) -> Self {
        self.max_response_size = max_response_size;
        self
    }

    pub fn with_metadata_max_age(mut self, max_age_ms: u64) -> Self {
        self.metadata_max_age_ms = max_age_ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        ClientConfig {
            hosts: self.hosts,
            client_id: self.client_id,
            request_timeout_ms: self.request_timeout_ms,
            queue_len: self.queue_len,
            max_response_size: self.max_response_size,
            metadata_max_age_ms: self.metadata_max_age_ms,
        }
    }
}
