use std::borrow::Cow;
use std::time::Duration;

use futures::Future;

use time;

use tokio_core::reactor::Handle;

use errors::{Error, ErrorKind, KafkaCode};
use network::{ConnectionConfig, KafkaRequest, KafkaResponse};
use protocol::{ApiKey, ApiKeys, FetchOffset, FetchPartition, FetchRequest, FetchTopic, Message,
               MessageSet, MetadataResponse, NodeId, Offset,
               OffsetCommitPartition, OffsetCommitRequest, OffsetCommitTopic, OffsetFetchRequest,
               OffsetFetchTopic, OffsetPartition, OffsetRequest, OffsetTopic, PartitionId,
               ProducePartitionData, ProduceRequest, ProduceTopicData, RequestHeader,
               RequiredAcks, Timestamp};
use client::{Cluster, ClientConfig};

/// A minimal broker descriptor, as reported by `Metadata` or
/// `GroupCoordinator`: the triple needed to dial a broker directly.
#[derive(Clone, Debug, PartialEq)]
pub struct Broker {
    pub node_id: NodeId,
    pub host: String,
    pub port: i32,
}

/// A future yielding `T` on success or a library `Error` on failure,
/// boxed so the concrete combinator chain producing it need not be named.
pub type StaticBoxFuture<T = (), E = Error> = Box<Future<Item = T, Error = E>>;

/// Top-level entry point: a typed operation maps onto a request/response
/// pair, routed through the `Cluster` to whichever broker currently owns
/// the relevant partition or consumer group.
///
/// `KafkaClient` itself is cheap to clone; the expensive state (cached
/// routing table, dialed connections) lives behind the `Cluster` it
/// wraps.
#[derive(Clone)]
pub struct KafkaClient {
    client_id: String,
    cluster: Cluster,
}

impl KafkaClient {
    pub fn new(handle: Handle, config: ClientConfig) -> KafkaClient {
        let seeds = config.hosts.iter().map(|addr| addr.to_string()).collect();

        let conn_config = ConnectionConfig {
            request_timeout_ms: config.request_timeout_ms,
            queue_len: config.queue_len,
            max_response_size: config.max_response_size,
        };

        KafkaClient {
            client_id: config.client_id.clone(),
            cluster: Cluster::new(handle, config.client_id, seeds, conn_config),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn header(&self, api_key: ApiKey, api_version: i16) -> RequestHeader<'static> {
        RequestHeader {
            api_key: api_key,
            api_version: api_version,
            correlation_id: 0,
            client_id: Some(Cow::Owned(self.client_id.clone())),
        }
    }

    /// Loads topic metadata for `topics` (an empty list asks for every
    /// topic the cluster knows about) and applies it to the routing
    /// cache. Any topic- or partition-level error code in the reply is
    /// left for the caller to inspect; only transport/decode failures
    /// fail this future.
    pub fn metadata(&self, topics: Vec<String>) -> StaticBoxFuture<MetadataResponse> {
        self.cluster.metadata(topics)
    }

    /// Cached partition ids for `topic`, refreshing metadata first if
    /// nothing is cached yet.
    pub fn partitions(&self, topic: &str) -> StaticBoxFuture<Vec<PartitionId>> {
        self.cluster.partitions(topic)
    }

    /// Resolves the coordinator broker for `group`, mapping onto a
    /// broker descriptor rather than a dialed client, per the
    /// `GroupCoordinator` operation contract.
    pub fn group_coordinator(&self, group: &str) -> StaticBoxFuture<Broker> {
        Box::new(self.cluster.coordinator(group).map(|(node_id, client)| {
            let addr = client.addr();
            Broker {
                node_id: node_id,
                host: addr.ip().to_string(),
                port: addr.port() as i32,
            }
        }))
    }

    /// Produces `message_set` to `(topic, partition)`. Returns `None`
    /// when `acks` is `RequiredAcks::None` (fire-and-forget; the broker
    /// never replies), `Some(offset)` of the first message in the set
    /// otherwise. A non-zero per-partition error code fails the future
    /// and, if it classifies as a stale leader, evicts the cached leader
    /// so the caller's retry triggers a fresh metadata lookup.
    pub fn produce(&self,
                   topic: &str,
                   partition: PartitionId,
                   message_set: MessageSet,
                   acks: RequiredAcks,
                   ack_timeout: Duration)
                   -> StaticBoxFuture<Option<Offset>> {
        let cluster = self.cluster.clone();
        let topic = topic.to_owned();
        let header = self.header(ApiKeys::Produce as ApiKey, 0);

        Box::new(self.cluster.leader(&topic, partition).and_then(move |client| {
            let request = KafkaRequest::Produce(ProduceRequest {
                header: header,
                required_acks: acks.into(),
                timeout: millis(ack_timeout),
                topics: vec![ProduceTopicData {
                    topic_name: topic.clone(),
                    partitions: vec![ProducePartitionData {
                        partition: partition,
                        message_set: message_set,
                    }],
                }],
            });

            client.send(request).and_then(move |resp| match resp {
                None => Ok(None),
                Some(KafkaResponse::Produce(resp)) => {
                    let partition_resp = resp.topics
                        .iter()
                        .find(|t| t.topic_name == topic)
                        .and_then(|t| t.partitions.iter().find(|p| p.partition == partition));

                    match partition_resp {
                        Some(p) if p.error_code == 0 => Ok(Some(p.offset)),
                        Some(p) => {
                            let code = KafkaCode::from(p.error_code);
                            if code.is_stale_leader() {
                                cluster.leader_is_down(&topic, partition);
                            }
                            Err(ErrorKind::KafkaError(code).into())
                        }
                        None => Err(ErrorKind::KafkaError(KafkaCode::UnknownTopicOrPartition).into()),
                    }
                }
                Some(_) => Err(ErrorKind::UnexpectedResponse(ApiKeys::Produce as ApiKey).into()),
            })
        }))
    }

    /// Fetches messages from `(topic, partition)` starting at `offset`.
    /// The returned records are flattened (one level of compression is
    /// expanded) and filtered to drop any record the broker returned
    /// with an offset below the one requested; the first surviving
    /// record's offset must equal `offset` exactly, or the call fails
    /// with a data error (the source's behavior, preserved pending
    /// clarification: see DESIGN.md).
    pub fn fetch(&self,
                topic: &str,
                partition: PartitionId,
                offset: Offset,
                min_bytes: i32,
                max_bytes: i32,
                max_wait: Duration)
                -> StaticBoxFuture<Vec<Message>> {
        let cluster = self.cluster.clone();
        let topic = topic.to_owned();
        let header = self.header(ApiKeys::Fetch as ApiKey, 0);

        Box::new(self.cluster.leader(&topic, partition).and_then(move |client| {
            let request = KafkaRequest::Fetch(FetchRequest {
                header: header,
                replica_id: -1,
                max_wait_time: millis(max_wait),
                min_bytes: min_bytes,
                topics: vec![FetchTopic {
                    topic_name: topic.clone(),
                    partitions: vec![FetchPartition {
                        partition: partition,
                        fetch_offset: offset,
                        max_bytes: max_bytes,
                    }],
                }],
            });

            client.send(request).and_then(move |resp| match resp {
                Some(KafkaResponse::Fetch(resp)) => {
                    let partition_data = resp.topics
                        .iter()
                        .find(|t| t.topic_name == topic)
                        .and_then(|t| t.partitions.iter().find(|p| p.partition == partition));

                    let partition_data = match partition_data {
                        Some(p) => p,
                        None => {
                            return Err(ErrorKind::KafkaError(KafkaCode::UnknownTopicOrPartition)
                                           .into())
                        }
                    };

                    if partition_data.error_code != 0 {
                        let code = KafkaCode::from(partition_data.error_code);
                        if code.is_stale_leader() {
                            cluster.leader_is_down(&topic, partition);
                        }
                        return Err(ErrorKind::KafkaError(code).into());
                    }

                    let messages: Vec<Message> = partition_data.message_set
                        .messages
                        .iter()
                        .cloned()
                        .filter(|m| m.offset >= offset)
                        .collect();

                    if let Some(first) = messages.first() {
                        if first.offset != offset {
                            bail!(ErrorKind::CodecError("first fetched offset does not match the \
                                                         requested offset"));
                        }
                    }

                    Ok(messages)
                }
                Some(_) => Err(ErrorKind::UnexpectedResponse(ApiKeys::Fetch as ApiKey).into()),
                None => Err(ErrorKind::Canceled("fetch request produced no reply").into()),
            })
        }))
    }

    /// Lists valid offsets for `(topic, partition)` as of `offset`'s
    /// time sentinel (`Latest`, `Earliest`, or an explicit ms timestamp).
    pub fn list_offsets(&self,
                       topic: &str,
                       partition: PartitionId,
                       offset: FetchOffset)
                       -> StaticBoxFuture<Vec<Offset>> {
        let cluster = self.cluster.clone();
        let topic = topic.to_owned();
        let header = self.header(ApiKeys::Offsets as ApiKey, 0);

        Box::new(self.cluster.leader(&topic, partition).and_then(move |client| {
            let request = KafkaRequest::Offset(OffsetRequest {
                header: header,
                replica_id: -1,
                topics: vec![OffsetTopic {
                    topic_name: topic.clone(),
                    partitions: vec![OffsetPartition {
                        partition: partition,
                        time: Timestamp::from(offset),
                        max_num_offsets: 1,
                    }],
                }],
            });

            client.send(request).and_then(move |resp| match resp {
                Some(KafkaResponse::Offset(resp)) => {
                    let partition_resp = resp.topics
                        .iter()
                        .find(|t| t.topic_name == topic)
                        .and_then(|t| t.partitions.iter().find(|p| p.partition == partition));

                    match partition_resp {
                        Some(p) if p.error_code == 0 => Ok(p.offsets.clone()),
                        Some(p) => {
                            let code = KafkaCode::from(p.error_code);
                            if code.is_stale_leader() {
                                cluster.leader_is_down(&topic, partition);
                            }
                            Err(ErrorKind::KafkaError(code).into())
                        }
                        None => Err(ErrorKind::KafkaError(KafkaCode::UnknownTopicOrPartition).into()),
                    }
                }
                Some(_) => Err(ErrorKind::UnexpectedResponse(ApiKeys::Offsets as ApiKey).into()),
                None => Err(ErrorKind::Canceled("offset request produced no reply").into()),
            })
        }))
    }

    /// Commits `offset` for `(group, topic, partition)` using the v1
    /// (standalone, non-generation-managed) `OffsetCommit` API. The
    /// commit timestamp is `now + retention`, per §4.5.
    pub fn commit_offset(&self,
                         group: &str,
                         topic: &str,
                         partition: PartitionId,
                         offset: Offset,
                         retention: Duration)
                         -> StaticBoxFuture<()> {
        let cluster = self.cluster.clone();
        let group = group.to_owned();
        let topic = topic.to_owned();
        let header = self.header(ApiKeys::OffsetCommit as ApiKey, 1);
        let ts = time::now_utc().to_timespec();
        let now = ts.sec * 1000 + ts.nsec as Timestamp / 1_000_000;
        let retention_ms = millis(retention) as Timestamp;

        Box::new(self.cluster.coordinator(&group).and_then(move |(_node_id, client)| {
            let request = KafkaRequest::OffsetCommit(OffsetCommitRequest {
                header: header,
                consumer_group: group.clone(),
                consumer_group_generation_id: -1,
                consumer_id: "".to_owned(),
                topics: vec![OffsetCommitTopic {
                    topic_name: topic.clone(),
                    partitions: vec![OffsetCommitPartition {
                        partition: partition,
                        offset: offset,
                        timestamp: now + retention_ms,
                        metadata: None,
                    }],
                }],
            });

            client.send(request).and_then(move |resp| match resp {
                Some(KafkaResponse::OffsetCommit(resp)) => {
                    let partition_resp = resp.topics
                        .iter()
                        .find(|t| t.topic_name == topic)
                        .and_then(|t| t.partitions.iter().find(|p| p.partition == partition));

                    match partition_resp {
                        Some(p) if p.error_code == 0 => Ok(()),
                        Some(p) => {
                            let code = KafkaCode::from(p.error_code);
                            if code.is_stale_coordinator() {
                                cluster.coordinator_is_down(&group);
                            }
                            Err(ErrorKind::KafkaError(code).into())
                        }
                        None => Err(ErrorKind::KafkaError(KafkaCode::UnknownTopicOrPartition).into()),
                    }
                }
                Some(_) => Err(ErrorKind::UnexpectedResponse(ApiKeys::OffsetCommit as ApiKey).into()),
                None => Err(ErrorKind::Canceled("offset commit produced no reply").into()),
            })
        }))
    }

    /// Fetches the committed offset for `(group, topic, partition)`
    /// using the v1 `OffsetFetch` API.
    pub fn fetch_offset(&self, group: &str, topic: &str, partition: PartitionId) -> StaticBoxFuture<Offset> {
        let cluster = self.cluster.clone();
        let group = group.to_owned();
        let topic = topic.to_owned();
        let header = self.header(ApiKeys::OffsetFetch as ApiKey, 1);

        Box::new(self.cluster.coordinator(&group).and_then(move |(_node_id, client)| {
            let request = KafkaRequest::OffsetFetch(OffsetFetchRequest {
                header: header,
                consumer_group: group.clone(),
                topics: vec![OffsetFetchTopic {
                    topic_name: topic.clone(),
                    partitions: vec![partition],
                }],
            });

            client.send(request).and_then(move |resp| match resp {
                Some(KafkaResponse::OffsetFetch(resp)) => {
                    let partition_resp = resp.topics
                        .iter()
                        .find(|t| t.topic_name == topic)
                        .and_then(|t| t.partitions.iter().find(|p| p.partition == partition));

                    match partition_resp {
                        Some(p) if p.error_code == 0 => Ok(p.offset),
                        Some(p) => {
                            let code = KafkaCode::from(p.error_code);
                            if code.is_stale_coordinator() {
                                cluster.coordinator_is_down(&group);
                            }
                            Err(ErrorKind::KafkaError(code).into())
                        }
                        None => Err(ErrorKind::KafkaError(KafkaCode::UnknownTopicOrPartition).into()),
                    }
                }
                Some(_) => Err(ErrorKind::UnexpectedResponse(ApiKeys::OffsetFetch as ApiKey).into()),
                None => Err(ErrorKind::Canceled("offset fetch produced no reply").into()),
            })
        }))
    }
}

fn millis(d: Duration) -> i32 {
    (d.as_secs() as i32) * 1000 + (d.subsec_nanos() / 1_000_000) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_descriptor_equality() {
        let a = Broker {
            node_id: 1,
            host: "localhost".to_owned(),
            port: 9092,
        };
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_millis_conversion() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::from_secs(30)), 30_000);
    }
}
