use std::time::Duration;

use protocol::RequiredAcks;
use compression::Compression;

/// How long the broker should wait, once a produce request arrives, for
/// `required_acks` replicas to acknowledge before replying with a
/// timeout error.
pub const DEFAULT_ACK_TIMEOUT_MILLIS: u64 = 30_000;

/// Tuning knobs for `KafkaProducer::send`. There is no batching or
/// lingering accumulator here: each `send` issues its own `Produce`
/// request immediately, carrying one record's message set, exactly as
/// the wire operation is defined.
#[derive(Clone, Debug)]
pub struct ProducerConfig {
    pub required_acks: RequiredAcks,
    pub ack_timeout: Duration,
    pub compression: Compression,
}

impl ProducerConfig {
    pub fn builder() -> ProducerBuilder {
        ProducerBuilder::new()
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        ProducerConfig {
            required_acks: RequiredAcks::One,
            ack_timeout: Duration::from_millis(DEFAULT_ACK_TIMEOUT_MILLIS),
            compression: Compression::None,
        }
    }
}

/// Builds a `ProducerConfig`, filling in defaults for anything not
/// explicitly overridden.
#[derive(Clone, Debug)]
pub struct ProducerBuilder {
    config: ProducerConfig,
}

impl ProducerBuilder {
    pub fn new() -> Self {
        ProducerBuilder { config: ProducerConfig::default() }
    }

    pub fn with_required_acks(mut self, required_acks: RequiredAcks) -> Self {
        self.config.required_acks = required_acks;
        self
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.config.ack_timeout = ack_timeout;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    pub fn build(self) -> ProducerConfig {
        self.config
    }
}

impl Default for ProducerBuilder {
    fn default() -> Self {
        ProducerBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ProducerBuilder::new().build();

        assert_eq!(config.required_acks, RequiredAcks::One);
        assert_eq!(config.ack_timeout, Duration::from_millis(DEFAULT_ACK_TIMEOUT_MILLIS));
    }

    #[test]
    fn test_builder_chained_setters() {
        let config = ProducerBuilder::new()
            .with_required_acks(RequiredAcks::All)
            .with_compression(Compression::Gzip)
            .build();

        assert_eq!(config.required_acks, RequiredAcks::All);
        assert_eq!(config.compression, Compression::Gzip);
    }
}
