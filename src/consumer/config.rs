use std::time::Duration;

/// Largest delay, in milliseconds, a `Fetch` is allowed to wait on the
/// broker side for `min_fetch_bytes` to accumulate before replying with
/// whatever it has.
pub const DEFAULT_MAX_WAIT_MILLIS: u64 = 500;
/// Smallest reply size, in bytes, the broker should try to accumulate
/// before replying (the broker still replies sooner if `max_wait` elapses).
pub const DEFAULT_MIN_FETCH_BYTES: i32 = 1;
/// Largest reply size, in bytes, requested per partition per fetch.
pub const DEFAULT_MAX_FETCH_BYTES: i32 = 1024 * 1024;
/// How long a committed offset is retained by the broker before it may
/// be expired, absent an explicit overwrite.
pub const DEFAULT_OFFSET_RETENTION_MILLIS: u64 = 24 * 60 * 60 * 1000;

/// Tuning knobs for `KafkaConsumer::fetch` and `commit_offset`. Unlike
/// the upstream crate's `ConsumerConfig`, this carries no group
/// membership, heartbeat, or assignment-strategy settings: this client
/// does not implement the consumer group rebalance protocol, so callers
/// own partition assignment and simply poll the offsets they choose.
#[derive(Clone, Debug)]
pub struct ConsumerConfig {
    pub group_id: String,
    pub max_wait: Duration,
    pub min_fetch_bytes: i32,
    pub max_fetch_bytes: i32,
    pub offset_retention: Duration,
}

impl ConsumerConfig {
    pub fn builder(group_id: String) -> ConsumerBuilder {
        ConsumerBuilder::new(group_id)
    }
}

/// Builds a `ConsumerConfig`, filling in defaults for anything not
/// explicitly overridden.
#[derive(Clone, Debug)]
pub struct ConsumerBuilder {
    group_id: String,
    max_wait: Duration,
    min_fetch_bytes: i32,
    max_fetch_bytes: i32,
    offset_retention: Duration,
}

impl ConsumerBuilder {
    pub fn new(group_id: String) -> Self {
        ConsumerBuilder {
            group_id: group_id,
            max_wait: Duration::from_millis(DEFAULT_MAX_WAIT_MILLIS),
            min_fetch_bytes: DEFAULT_MIN_FETCH_BYTES,
            max_fetch_bytes: DEFAULT_MAX_FETCH_BYTES,
            offset_retention: Duration::from_millis(DEFAULT_OFFSET_RETENTION_MILLIS),
        }
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_min_fetch_bytes(mut self, min_fetch_bytes: i32) -> Self {
        self.min_fetch_bytes = min_fetch_bytes;
        self
    }

    pub fn with_max_fetch_bytes(mut self, max_fetch_bytes: i32) -> Self {
        self.max_fetch_bytes = max_fetch_bytes;
        self
    }

    pub fn with_offset_retention(mut self, offset_retention: Duration) -> Self {
        self.offset_retention = offset_retention;
        self
    }

    pub fn build(self) -> ConsumerConfig {
        ConsumerConfig {
            group_id: self.group_id,
            max_wait: self.max_wait,
            min_fetch_bytes: self.min_fetch_bytes,
            max_fetch_bytes: self.max_fetch_bytes,
            offset_retention: self.offset_retention,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ConsumerBuilder::new("my-group".to_owned()).build();

        assert_eq!(config.group_id, "my-group");
        assert_eq!(config.min_fetch_bytes, DEFAULT_MIN_FETCH_BYTES);
        assert_eq!(config.max_fetch_bytes, DEFAULT_MAX_FETCH_BYTES);
    }

    #[test]
    fn test_builder_chained_setters() {
        let config = ConsumerBuilder::new("my-group".to_owned())
            .with_max_wait(Duration::from_millis(100))
            .with_min_fetch_bytes(64)
            .with_max_fetch_bytes(4096)
            .build();

        assert_eq!(config.max_wait, Duration::from_millis(100));
        assert_eq!(config.min_fetch_bytes, 64);
        assert_eq!(config.max_fetch_bytes, 4096);
    }
}
