use client::KafkaClient;
use consumer::{ConsumerConfig, KafkaConsumer};

/// Builds a `KafkaConsumer` from a `KafkaClient` and a group id, with the
/// same fluent-setter shape as `ClientBuilder`/`ProducerBuilder`.
pub struct ConsumerBuilder {
    client: KafkaClient,
    config: ConsumerConfig,
}

impl ConsumerBuilder {
    pub fn new(client: KafkaClient, group_id: String) -> Self {
        ConsumerBuilder {
            client: client,
            config: ConsumerConfig::builder(group_id).build(),
        }
    }

    pub fn with_config(mut self, config: ConsumerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> KafkaConsumer {
        KafkaConsumer::new(self.client, self.config)
    }
}
