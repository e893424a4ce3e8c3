use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use bytes::{BigEndian, BufMut, ByteOrder, BytesMut};

use futures::{Async, Future, Stream, future};
use futures::future::{Either, Loop};
use futures::sync::mpsc;
use futures::sync::oneshot;

use tokio_core::net::TcpStream;
use tokio_core::reactor::{Handle, Timeout};
use tokio_io::io::{read_exact, write_all};
use tokio_io::{AsyncRead, ReadHalf, WriteHalf};

use errors::{Error, ErrorKind, Result};
use protocol::CorrelationId;
use network::request::{KafkaRequest, KafkaResponse, ResponseDecoder};

/// One caller-issued request awaiting dispatch on a connection's send
/// channel. `complete` is fired exactly once: with `Ok(Some(_))` for a
/// request that got a typed reply, `Ok(None)` for a request sent in
/// no-reply mode (`RequiredAcks::None`), or `Err(_)` for any transport,
/// framing, decode, or queueing failure.
pub struct Job {
    pub request: KafkaRequest,
    pub complete: oneshot::Sender<Result<Option<KafkaResponse>>>,
}

/// A job that has been written to the socket and is waiting for its
/// matching reply. Kept in strict FIFO order: the server is guaranteed
/// to answer in the order it received requests on this connection.
struct PendingJob {
    correlation_id: CorrelationId,
    decode: ResponseDecoder,
    complete: oneshot::Sender<Result<Option<KafkaResponse>>>,
}

type PendingQueue = Rc<RefCell<VecDeque<PendingJob>>>;

#[derive(Clone, Copy, Debug)]
pub struct ConnectionConfig {
    /// Deadline applied independently to each socket write and to each
    /// full response read (length prefix plus body). A deadline firing
    /// mid-write or mid-read is treated exactly like any other I/O
    /// error: the connection is torn down and every pending job fails.
    pub request_timeout_ms: u64,
    /// Target depth of the pending-reply queue. Retained as a tunable,
    /// not yet enforced as a hard backpressure limit (see DESIGN.md).
    pub queue_len: usize,
    /// Largest response body this connection will allocate a buffer for.
    pub max_response_size: usize,
}

pub const DEFAULT_REQUEST_TIMEOUT_MILLIS: u64 = 30_000;
pub const DEFAULT_QUEUE_LEN: usize = 1000;
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 100 * 1024 * 1024;

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MILLIS,
            queue_len: DEFAULT_QUEUE_LEN,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

/// A single pipelined TCP connection to one broker.
///
/// Owns a send channel that callers enqueue `Job`s onto. Two tasks are
/// spawned on the reactor at connect time: a send loop that serializes
/// and writes requests (assigning each its correlation id), and a
/// receive loop that reads framed replies and matches them to the head
/// of the pending queue. Neither task touches the other's state except
/// through the shared `PendingQueue`, which only the two tasks ever see.
#[derive(Clone)]
pub struct Connection {
    sender: mpsc::UnboundedSender<Job>,
    closed: Rc<Cell<bool>>,
}

impl Connection {
    pub fn connect(handle: &Handle,
                   addr: &SocketAddr,
                   config: ConnectionConfig)
                   -> Box<Future<Item = Connection, Error = Error>> {
        debug!("dialing broker at {}", addr);

        let handle = handle.clone();
        let max_response_size = config.max_response_size;
        let request_timeout_ms = config.request_timeout_ms;

        let fut = TcpStream::connect(addr, &handle)
            .map_err(Error::from)
            .map(move |stream| {
                let (read, write) = stream.split();
                let (tx, rx) = mpsc::unbounded();
                let pending: PendingQueue = Rc::new(RefCell::new(VecDeque::new()));
                let next_id = Rc::new(Cell::new(0 as CorrelationId));
                let closed = Rc::new(Cell::new(false));

                spawn_send_loop(&handle,
                                rx,
                                write,
                                pending.clone(),
                                next_id,
                                closed.clone(),
                                request_timeout_ms);
                spawn_receive_loop(&handle,
                                   read,
                                   pending,
                                   closed.clone(),
                                   max_response_size,
                                   request_timeout_ms);

                Connection {
                    sender: tx,
                    closed: closed,
                }
            });

        Box::new(fut)
    }

    /// Enqueues `job` on the send channel. Fails fast without touching
    /// the socket if this connection has already observed a fatal error.
    pub fn send(&self, job: Job) -> ::std::result::Result<(), Job> {
        if self.closed.get() {
            return Err(job);
        }

        self.sender
            .unbounded_send(job)
            .map_err(|send_err| send_err.into_inner())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

type SendState = (mpsc::UnboundedReceiver<Job>, WriteHalf<TcpStream>);

/// Races `f` against a fresh `request_timeout_ms` timer. A deadline that
/// fires first is reported as a plain I/O error, indistinguishable from
/// any other transport failure to the caller.
fn with_deadline<F>(handle: &Handle,
                    request_timeout_ms: u64,
                    f: F)
                    -> Box<Future<Item = F::Item, Error = io::Error>>
    where F: Future<Error = io::Error> + 'static,
          F::Item: 'static
{
    let timeout = match Timeout::new(Duration::from_millis(request_timeout_ms), handle) {
        Ok(timeout) => timeout,
        Err(err) => return Box::new(future::err(err)),
    };

    Box::new(f.select2(timeout).then(|res| match res {
        Ok(Either::A((item, _))) => Ok(item),
        Ok(Either::B(((), _))) => {
            Err(io::Error::new(io::ErrorKind::TimedOut, "request deadline exceeded"))
        }
        Err(Either::A((err, _))) => Err(err),
        Err(Either::B((err, _))) => Err(err),
    }))
}

fn spawn_send_loop(handle: &Handle,
                   rx: mpsc::UnboundedReceiver<Job>,
                   write: WriteHalf<TcpStream>,
                   pending: PendingQueue,
                   next_id: Rc<Cell<CorrelationId>>,
                   closed: Rc<Cell<bool>>,
                   request_timeout_ms: u64) {
    let handle = handle.clone();

    let task = future::loop_fn((rx, write), move |(rx, write)| {
        let pending = pending.clone();
        let closed = closed.clone();
        let next_id = next_id.clone();
        let handle = handle.clone();

        rx.into_future()
            .map_err(|_| ())
            .and_then(move |(maybe_job, rx)| -> Box<Future<Item = Loop<(), SendState>, Error = ()>> {
                let job = match maybe_job {
                    Some(job) => job,
                    None => return Box::new(future::ok(Loop::Break(()))),
                };

                if closed.get() {
                    // The receive loop already failed and exited; it will
                    // never drain `pending` again, so writing this job
                    // would leave it stuck forever. Fail it and every job
                    // still queued behind it instead of writing.
                    drop(job.complete.send(Err(ErrorKind::BrokerClosed.into())));
                    let mut rx = rx;
                    drain_send_channel(&mut rx);
                    return Box::new(future::ok(Loop::Break(())));
                }

                let correlation_id = next_id.get();
                next_id.set(correlation_id.wrapping_add(1));

                let api_key = job.request.api_key();
                let complete = job.complete;

                let decoder = match job.request.decoder() {
                    Ok(decoder) => decoder,
                    Err(err) => {
                        drop(complete.send(Err(err)));
                        return Box::new(future::ok(Loop::Continue((rx, write))));
                    }
                };

                trace!("sending request api_key={} correlation_id={}", api_key, correlation_id);

                let body = match job.request.encode(correlation_id) {
                    Ok(body) => body,
                    Err(err) => {
                        drop(complete.send(Err(err)));
                        return Box::new(future::ok(Loop::Continue((rx, write))));
                    }
                };

                let mut framed = BytesMut::with_capacity(4 + body.len());
                framed.put_i32::<BigEndian>(body.len() as i32);
                framed.extend_from_slice(&body);

                let pending = pending.clone();
                let closed = closed.clone();

                let write_fut = with_deadline(&handle, request_timeout_ms, write_all(write, framed.to_vec()));

                Box::new(write_fut.then(move |res| {
                    let mut rx = rx;

                    match res {
                        Ok((write, _)) => {
                            match decoder {
                                Some(decode) => {
                                    pending.borrow_mut().push_back(PendingJob {
                                        correlation_id: correlation_id,
                                        decode: decode,
                                        complete: complete,
                                    });
                                }
                                None => drop(complete.send(Ok(None))),
                            }

                            Ok(Loop::Continue((rx, write)))
                        }
                        Err(err) => {
                            closed.set(true);
                            drop(complete.send(Err(Error::from(err))));
                            drain_pending(&pending, "write failed");
                            drain_send_channel(&mut rx);
                            Ok(Loop::Break(()))
                        }
                    }
                }))
            })
    });

    handle.spawn(task);
}

fn spawn_receive_loop(handle: &Handle,
                      read: ReadHalf<TcpStream>,
                      pending: PendingQueue,
                      closed: Rc<Cell<bool>>,
                      max_response_size: usize,
                      request_timeout_ms: u64) {
    let handle = handle.clone();

    let task = future::loop_fn(read, move |read| {
        let pending = pending.clone();
        let closed = closed.clone();
        let handle = handle.clone();

        let read_fut = read_exact(read, [0u8; 4])
            .and_then(move |(read, len_buf)| {
                let len = BigEndian::read_i32(&len_buf);

                if len < 0 || len as usize > max_response_size {
                    return Err(io::Error::new(io::ErrorKind::InvalidData,
                                              "response length out of bounds"));
                }

                Ok((read, len as usize))
            })
            .and_then(|(read, len)| read_exact(read, vec![0u8; len]));

        with_deadline(&handle, request_timeout_ms, read_fut)
            .then(move |res| -> ::std::result::Result<Loop<(), ReadHalf<TcpStream>>, ()> {
                match res {
                    Ok((read, body)) => {
                        if body.len() < 4 {
                            closed.set(true);
                            drain_pending(&pending, "response shorter than a correlation id");
                            return Ok(Loop::Break(()));
                        }

                        let correlation_id = BigEndian::read_i32(&body[..4]);
                        let next = pending.borrow_mut().pop_front();

                        match next {
                            None => {
                                warn!("received reply for correlation_id={} with no pending job",
                                      correlation_id);
                                closed.set(true);
                                Ok(Loop::Break(()))
                            }
                            Some(job) => {
                                if job.correlation_id != correlation_id {
                                    warn!("correlation id mismatch: expected {} got {}",
                                          job.correlation_id,
                                          correlation_id);
                                    drop(job.complete
                                             .send(Err(ErrorKind::CorrelationIdMismatch(job.correlation_id,
                                                                                        correlation_id)
                                                               .into())));
                                    closed.set(true);
                                    drain_pending(&pending, "correlation id mismatch");
                                    return Ok(Loop::Break(()));
                                }

                                match (job.decode)(&body[4..]) {
                                    Ok(resp) => {
                                        drop(job.complete.send(Ok(Some(resp))));
                                        Ok(Loop::Continue(read))
                                    }
                                    Err(err) => {
                                        warn!("failed to decode response for correlation_id={}: {}",
                                              correlation_id,
                                              err);
                                        drop(job.complete.send(Err(err)));
                                        closed.set(true);
                                        drain_pending(&pending, "response decode failed");
                                        Ok(Loop::Break(()))
                                    }
                                }
                            }
                        }
                    }
                    Err(err) => {
                        closed.set(true);
                        drain_pending(&pending, &format!("read failed: {}", err));
                        Ok(Loop::Break(()))
                    }
                }
            })
    });

    handle.spawn(task);
}

fn drain_pending(pending: &PendingQueue, reason: &str) {
    warn!("closing connection: {}", reason);

    let mut queue = pending.borrow_mut();

    while let Some(job) = queue.pop_front() {
        drop(job.complete.send(Err(ErrorKind::BrokerClosed.into())));
    }
}

fn drain_send_channel(rx: &mut mpsc::UnboundedReceiver<Job>) {
    loop {
        match rx.poll() {
            Ok(Async::Ready(Some(job))) => {
                drop(job.complete.send(Err(ErrorKind::BrokerClosed.into())));
            }
            _ => break,
        }
    }
}
