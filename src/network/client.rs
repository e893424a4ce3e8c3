use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;

use futures::{Future, future};
use futures::sync::oneshot;

use tokio_core::reactor::Handle;

use errors::{Error, ErrorKind};
use network::connection::{Connection, ConnectionConfig, Job};
use network::request::{KafkaRequest, KafkaResponse};

/// A lazily-dialed connection to one broker address.
///
/// `send` transparently (re)dials if the current connection has never
/// been established or has observed a fatal error; callers never see the
/// underlying `Connection` directly.
#[derive(Clone)]
pub struct BrokerClient {
    handle: Handle,
    addr: SocketAddr,
    config: ConnectionConfig,
    conn: Rc<RefCell<Option<Connection>>>,
}

impl BrokerClient {
    pub fn new(handle: Handle, addr: SocketAddr, config: ConnectionConfig) -> Self {
        BrokerClient {
            handle: handle,
            addr: addr,
            config: config,
            conn: Rc::new(RefCell::new(None)),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn connection(&self) -> Box<Future<Item = Connection, Error = Error>> {
        let existing = self.conn.borrow().clone();

        match existing {
            Some(conn) => {
                if conn.is_closed() {
                    self.dial()
                } else {
                    Box::new(future::ok(conn))
                }
            }
            None => self.dial(),
        }
    }

    fn dial(&self) -> Box<Future<Item = Connection, Error = Error>> {
        let slot = self.conn.clone();

        Box::new(Connection::connect(&self.handle, &self.addr, self.config).map(move |conn| {
            *slot.borrow_mut() = Some(conn.clone());
            conn
        }))
    }

    /// Sends `request`, yielding `Some(response)` for the common case,
    /// `None` only for a Produce sent with `RequiredAcks::None`.
    pub fn send(&self, request: KafkaRequest) -> Box<Future<Item = Option<KafkaResponse>, Error = Error>> {
        let (tx, rx) = oneshot::channel();

        let job = Job {
            request: request,
            complete: tx,
        };

        Box::new(self.connection().and_then(move |conn| match conn.send(job) {
            Ok(()) => {
                future::Either::A(rx.map_err(|_| Error::from(ErrorKind::BrokerClosed))
                                      .and_then(|res| res))
            }
            Err(_job) => future::Either::B(future::err(Error::from(ErrorKind::BrokerClosed))),
        }))
    }

    /// Drops the current connection, if any, forcing the next `send` to
    /// redial. Idempotent.
    pub fn close(&self) {
        self.conn.borrow_mut().take();
    }
}
