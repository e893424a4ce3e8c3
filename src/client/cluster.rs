use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::net::ToSocketAddrs;
use std::rc::Rc;

use futures::Future;
use futures::future;

use tokio_core::reactor::Handle;

use errors::{Error, ErrorKind, KafkaCode, MultiError};
use network::{BrokerClient, BrokerPool, ConnectionConfig, KafkaRequest, KafkaResponse};
use protocol::{ApiKey, ApiKeys, GroupCoordinatorRequest, MetadataRequest, MetadataResponse,
               NodeId, PartitionId, RequestHeader};

/// Caches topic/partition leadership and group coordinator assignments,
/// refreshing them on demand against whatever brokers are currently
/// known. Mirrors the `h12w/kafka` cluster router: readers that miss
/// the cache trigger a best-effort, fail-fast-per-broker refresh rather
/// than blocking on a single-flight lock.
#[derive(Clone)]
pub struct Cluster {
    handle: Handle,
    client_id: String,
    pool: BrokerPool,
    partitions: Rc<RefCell<HashMap<String, Vec<PartitionId>>>>,
    leaders: Rc<RefCell<HashMap<(String, PartitionId), NodeId>>>,
    coordinators: Rc<RefCell<HashMap<String, NodeId>>>,
}

impl Cluster {
    pub fn new(handle: Handle, client_id: String, seeds: Vec<String>, config: ConnectionConfig) -> Self {
        let addrs = resolve_all(&seeds);
        let pool = BrokerPool::new(handle.clone(), config, addrs);

        Cluster {
            handle: handle,
            client_id: client_id,
            pool: pool,
            partitions: Rc::new(RefCell::new(HashMap::new())),
            leaders: Rc::new(RefCell::new(HashMap::new())),
            coordinators: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns the cached partition leader for `(topic, partition)`,
    /// refreshing metadata for `topic` first if the entry is missing.
    pub fn leader(&self, topic: &str, partition: PartitionId) -> Box<Future<Item = BrokerClient, Error = Error>> {
        if let Some(client) = self.cached_leader(topic, partition) {
            return Box::new(future::ok(client));
        }

        let this = self.clone();
        let topic = topic.to_owned();

        Box::new(self.refresh_metadata(vec![topic.clone()]).and_then(move |resp| {
            if let Some(client) = this.cached_leader(&topic, partition) {
                return Ok(client);
            }

            Err(ErrorKind::KafkaError(topic_or_partition_error(&resp, &topic, partition)).into())
        }))
    }

    /// Returns the cached partition id list for `topic`, refreshing
    /// metadata first if nothing is cached yet.
    pub fn partitions(&self, topic: &str) -> Box<Future<Item = Vec<PartitionId>, Error = Error>> {
        if let Some(partitions) = self.partitions.borrow().get(topic) {
            return Box::new(future::ok(partitions.clone()));
        }

        let this = self.clone();
        let topic = topic.to_owned();

        Box::new(self.refresh_metadata(vec![topic.clone()]).and_then(move |resp| {
            if let Some(partitions) = this.partitions.borrow().get(&topic) {
                return Ok(partitions.clone());
            }

            let code = resp.topics
                .iter()
                .find(|t| t.topic_name == topic)
                .map(|t| KafkaCode::from(t.error_code))
                .unwrap_or(KafkaCode::UnknownTopicOrPartition);

            Err(ErrorKind::KafkaError(code).into())
        }))
    }

    /// Issues a Metadata request for `topics` against every known broker,
    /// applying the result to the routing caches. Unlike `leader`/
    /// `partitions`, this always goes to the network: it is the
    /// operation that populates those caches in the first place.
    pub fn metadata(&self, topics: Vec<String>) -> Box<Future<Item = MetadataResponse, Error = Error>> {
        self.refresh_metadata(topics)
    }

    /// Returns the cached coordinator for `group` as `(node_id, client)`,
    /// discovering it via `GroupCoordinator` against any known broker if
    /// it is missing.
    pub fn coordinator(&self, group: &str) -> Box<Future<Item = (NodeId, BrokerClient), Error = Error>> {
        if let Some(&node_id) = self.coordinators.borrow().get(group) {
            if let Ok(client) = self.pool.client_for_node(node_id) {
                return Box::new(future::ok((node_id, client)));
            }
        }

        let this = self.clone();
        let group = group.to_owned();
        let clients = self.pool.broker_clients();

        let request = KafkaRequest::GroupCoordinator(GroupCoordinatorRequest {
            header: RequestHeader {
                api_key: ApiKeys::GroupCoordinator as ApiKey,
                api_version: 0,
                correlation_id: 0,
                client_id: Some(Cow::Owned(self.client_id.clone())),
            },
            group_id: group.clone(),
        });

        Box::new(try_each(clients.into_iter(), request, Vec::new(), |resp| match resp {
                KafkaResponse::GroupCoordinator(resp) => Some(resp),
                _ => None,
            })
            .then(move |res| match res {
                Ok(resp) => {
                    if resp.error_code != 0 {
                        return Err(ErrorKind::KafkaError(KafkaCode::from(resp.error_code)).into());
                    }

                    let addr = resolve_one(&resp.coordinator_host, resp.coordinator_port)
                        .ok_or_else(|| {
                            Error::from(ErrorKind::BrokerNotFound(resp.coordinator_id))
                        })?;

                    this.pool.update_broker(resp.coordinator_id, addr);
                    this.coordinators.borrow_mut().insert(group.clone(), resp.coordinator_id);

                    this.pool.client_for_node(resp.coordinator_id).map(|client| (resp.coordinator_id, client))
                }
                Err(errors) => {
                    warn!("coordinator discovery for group {} failed against every known broker", group);
                    Err(ErrorKind::RefreshFailed(errors).into())
                }
            }))
    }

    /// Evicts the cached leader for `(topic, partition)`. The next
    /// `leader` call for it triggers a fresh metadata refresh even if
    /// the evicted entry had been valid a moment ago.
    pub fn leader_is_down(&self, topic: &str, partition: PartitionId) {
        debug!("evicting leader for {}-{}", topic, partition);
        self.leaders.borrow_mut().remove(&(topic.to_owned(), partition));
    }

    /// Evicts the cached coordinator for `group`.
    pub fn coordinator_is_down(&self, group: &str) {
        debug!("evicting coordinator for group {}", group);
        self.coordinators.borrow_mut().remove(group);
    }

    fn cached_leader(&self, topic: &str, partition: PartitionId) -> Option<BrokerClient> {
        let node_id = *self.leaders.borrow().get(&(topic.to_owned(), partition))?;
        self.pool.client_for_node(node_id).ok()
    }

    /// Issues a Metadata request for `topics` against every known broker
    /// in turn, stopping at the first success and applying its contents
    /// to the routing caches. Fails only if every broker attempt fails.
    fn refresh_metadata(&self, topics: Vec<String>) -> Box<Future<Item = MetadataResponse, Error = Error>> {
        debug!("refreshing metadata for {:?}", topics);

        let this = self.clone();
        let clients = self.pool.broker_clients();

        let request = KafkaRequest::Metadata(MetadataRequest {
            header: RequestHeader {
                api_key: ApiKeys::Metadata as ApiKey,
                api_version: 0,
                correlation_id: 0,
                client_id: Some(Cow::Owned(self.client_id.clone())),
            },
            topic_names: topics,
        });

        Box::new(try_each(clients.into_iter(), request, Vec::new(), |resp| match resp {
                KafkaResponse::Metadata(resp) => Some(resp),
                _ => None,
            })
            .then(move |res| match res {
                Ok(resp) => {
                    this.apply_metadata(&resp);
                    Ok(resp)
                }
                Err(errors) => {
                    warn!("metadata refresh failed against every known broker");
                    Err(ErrorKind::RefreshFailed(errors).into())
                }
            }))
    }

    fn apply_metadata(&self, resp: &MetadataResponse) {
        for broker in &resp.brokers {
            match resolve_one(&broker.host, broker.port) {
                Some(addr) => self.pool.update_broker(broker.node_id, addr),
                None => warn!("broker {} advertised unresolvable address {}:{}",
                              broker.node_id,
                              broker.host,
                              broker.port),
            }
        }

        for topic in &resp.topics {
            if topic.error_code != 0 {
                continue;
            }

            let partition_ids = topic.partitions.iter().map(|p| p.partition_id).collect();
            self.partitions.borrow_mut().insert(topic.topic_name.clone(), partition_ids);

            for partition in &topic.partitions {
                if partition.error_code == 0 {
                    self.leaders
                        .borrow_mut()
                        .insert((topic.topic_name.clone(), partition.partition_id), partition.leader);
                }
            }
        }
    }
}

fn topic_or_partition_error(resp: &MetadataResponse, topic: &str, partition: PartitionId) -> KafkaCode {
    match resp.topics.iter().find(|t| t.topic_name == topic) {
        None => KafkaCode::UnknownTopicOrPartition,
        Some(t) if t.error_code != 0 => KafkaCode::from(t.error_code),
        Some(t) => {
            t.partitions
                .iter()
                .find(|p| p.partition_id == partition)
                .map(|p| KafkaCode::from(p.error_code))
                .unwrap_or(KafkaCode::UnknownTopicOrPartition)
        }
    }
}

/// Tries `request` against each client in turn, stopping at the first
/// reply that `extract` accepts. Every failed or unexpected attempt is
/// recorded in `errors`; if every client is exhausted, the accumulated
/// errors are returned instead.
fn try_each<T, F>(mut clients: ::std::vec::IntoIter<BrokerClient>,
                  request: KafkaRequest,
                  mut errors: Vec<Error>,
                  extract: F)
                  -> Box<Future<Item = T, Error = MultiError>>
    where T: 'static,
          F: Fn(KafkaResponse) -> Option<T> + Clone + 'static
{
    match clients.next() {
        None => Box::new(future::err(MultiError(errors))),
        Some(client) => {
            let next_request = request.clone();
            let expected_api_key = request.api_key();

            Box::new(client.send(request).then(move |res| match res {
                Ok(Some(resp)) => {
                    match extract(resp) {
                        Some(value) => {
                            Box::new(future::ok(value)) as Box<Future<Item = T, Error = MultiError>>
                        }
                        None => {
                            errors.push(ErrorKind::UnexpectedResponse(expected_api_key).into());
                            try_each(clients, next_request, errors, extract)
                        }
                    }
                }
                Ok(None) => {
                    errors.push(ErrorKind::Canceled("broker sent no reply to a refresh request").into());
                    try_each(clients, next_request, errors, extract)
                }
                Err(err) => {
                    errors.push(err);
                    try_each(clients, next_request, errors, extract)
                }
            }))
        }
    }
}

fn resolve_one(host: &str, port: i32) -> Option<::std::net::SocketAddr> {
    (host, port as u16).to_socket_addrs().ok().and_then(|mut addrs| addrs.next())
}

fn resolve_all(hosts: &[String]) -> Vec<::std::net::SocketAddr> {
    let mut addrs = Vec::new();

    for host in hosts {
        match host.to_socket_addrs() {
            Ok(resolved) => addrs.extend(resolved),
            Err(err) => warn!("seed host {} did not resolve: {}", host, err),
        }
    }

    addrs
}
