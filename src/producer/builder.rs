use client::KafkaClient;
use producer::{DefaultPartitioner, KafkaProducer, Partitioner, ProducerConfig};

/// Builds a `KafkaProducer` from a `KafkaClient`, with the same
/// fluent-setter shape as `ClientBuilder`/`ConsumerBuilder`.
pub struct ProducerBuilder<P = DefaultPartitioner> {
    client: KafkaClient,
    config: ProducerConfig,
    partitioner: P,
}

impl ProducerBuilder<DefaultPartitioner> {
    pub fn new(client: KafkaClient) -> Self {
        ProducerBuilder {
            client: client,
            config: ProducerConfig::default(),
            partitioner: DefaultPartitioner::new(),
        }
    }
}

impl<P> ProducerBuilder<P>
    where P: Partitioner + Clone + 'static
{
    pub fn with_config(mut self, config: ProducerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_partitioner<Q>(self, partitioner: Q) -> ProducerBuilder<Q>
        where Q: Partitioner + Clone + 'static
    {
        ProducerBuilder {
            client: self.client,
            config: self.config,
            partitioner: partitioner,
        }
    }

    pub fn build(self) -> KafkaProducer<P> {
        KafkaProducer::with_partitioner(self.client, self.config, self.partitioner)
    }
}
