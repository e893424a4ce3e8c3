use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::cell::RefCell;
use std::rc::Rc;

use tokio_core::reactor::Handle;

use errors::{Error, ErrorKind, Result};
use network::client::BrokerClient;
use network::connection::ConnectionConfig;
use protocol::NodeId;

/// Tracks a `BrokerClient` per known node id, plus the seed addresses
/// used to bootstrap before any `Metadata` response has told us what
/// node ids exist. Mirrors the broker map a cluster router keeps: the
/// pool itself has no notion of leaders, partitions or coordinators,
/// only "how do I reach node N".
#[derive(Clone)]
pub struct BrokerPool {
    handle: Handle,
    config: ConnectionConfig,
    seeds: Vec<SocketAddr>,
    addrs: Rc<RefCell<HashMap<NodeId, SocketAddr>>>,
    clients: Rc<RefCell<HashMap<NodeId, BrokerClient>>>,
}

impl BrokerPool {
    pub fn new(handle: Handle, config: ConnectionConfig, seeds: Vec<SocketAddr>) -> Self {
        BrokerPool {
            handle: handle,
            config: config,
            seeds: seeds,
            addrs: Rc::new(RefCell::new(HashMap::new())),
            clients: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Bootstrap clients dialed straight off the seed list. Used for the
    /// very first `Metadata` request, before any node id is known.
    pub fn seed_clients(&self) -> Vec<BrokerClient> {
        self.seeds
            .iter()
            .map(|addr| BrokerClient::new(self.handle.clone(), *addr, self.config))
            .collect()
    }

    /// Records (or updates) the address a node id resolves to, as
    /// reported by broker metadata. Does not touch any already-dialed
    /// client for that node; a stale address only takes effect the next
    /// time the client has to redial.
    pub fn update_broker(&self, node_id: NodeId, addr: SocketAddr) {
        self.addrs.borrow_mut().insert(node_id, addr);
    }

    pub fn client_for_node(&self, node_id: NodeId) -> Result<BrokerClient> {
        if let Some(client) = self.clients.borrow().get(&node_id) {
            return Ok(client.clone());
        }

        let addr = *self.addrs
                        .borrow()
                        .get(&node_id)
                        .ok_or_else(|| Error::from(ErrorKind::BrokerNotFound(node_id)))?;

        let client = BrokerClient::new(self.handle.clone(), addr, self.config);

        self.clients.borrow_mut().insert(node_id, client.clone());

        Ok(client)
    }

    pub fn known_node_ids(&self) -> Vec<NodeId> {
        self.addrs.borrow().keys().cloned().collect()
    }

    /// Every broker this pool can currently reach: node-id-bound clients
    /// first, then any seed address not already covered by one. Used by
    /// the cluster router to fan a refresh out across "the known broker
    /// set" without caring which of those brokers has a node id yet.
    pub fn broker_clients(&self) -> Vec<BrokerClient> {
        let mut seen = HashSet::new();
        let mut clients = Vec::new();

        for client in self.clients.borrow().values() {
            if seen.insert(client.addr()) {
                clients.push(client.clone());
            }
        }

        for client in self.seed_clients() {
            if seen.insert(client.addr()) {
                clients.push(client);
            }
        }

        clients
    }
}
