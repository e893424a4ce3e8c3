//! Exercises `KafkaClient` end to end against a hand-scripted TCP listener
//! standing in for a broker. No real Kafka cluster is involved; each test
//! spins up its own listener, accepts exactly the connections the scenario
//! needs, and writes back fixture bytes built the same way the protocol
//! module's own unit tests build theirs.
//!
//! Gated behind `integration_test` since it spawns real sockets and threads
//! rather than running as a pure unit test.
#![cfg(feature = "integration_test")]

extern crate kpax;
extern crate futures;
extern crate tokio_core;
extern crate bytes;
extern crate crc;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use bytes::{BigEndian, ByteOrder};

use tokio_core::reactor::Core;

use kpax::{ClientBuilder, KafkaClient, RequiredAcks, Message, MessageSet, MessageTimestamp,
          Compression};

fn push_i16(buf: &mut Vec<u8>, v: i16) {
    let mut tmp = [0u8; 2];
    BigEndian::write_i16(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

fn push_i32(buf: &mut Vec<u8>, v: i32) {
    let mut tmp = [0u8; 4];
    BigEndian::write_i32(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

fn push_i64(buf: &mut Vec<u8>, v: i64) {
    let mut tmp = [0u8; 8];
    BigEndian::write_i64(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

fn push_str(buf: &mut Vec<u8>, s: &str) {
    push_i16(buf, s.len() as i16);
    buf.extend_from_slice(s.as_bytes());
}

fn push_bytes(buf: &mut Vec<u8>, b: Option<&[u8]>) {
    match b {
        Some(b) => {
            push_i32(buf, b.len() as i32);
            buf.extend_from_slice(b);
        }
        None => push_i32(buf, -1),
    }
}

/// Builds one v0 message-set record the same way `MessageSetEncoder` does:
/// an 8-byte offset and 4-byte size prefix around a CRC-protected body.
fn push_record(buf: &mut Vec<u8>, offset: i64, key: Option<&[u8]>, value: Option<&[u8]>) {
    let mut body = Vec::new();
    body.push(0u8); // magic byte
    body.push(0u8); // attributes: no compression, CreateTime
    push_bytes(&mut body, key);
    push_bytes(&mut body, value);

    let crc = crc::crc32::checksum_ieee(&body);

    push_i64(buf, offset);
    push_i32(buf, (4 + body.len()) as i32); // message size: crc + body
    let mut tmp = [0u8; 4];
    BigEndian::write_u32(&mut tmp, crc);
    buf.extend_from_slice(&tmp);
    buf.extend_from_slice(&body);
}

/// Wraps a response body with the 4-byte length prefix every frame carries.
fn frame(body: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + body.len());
    push_i32(&mut out, body.len() as i32);
    out.extend_from_slice(&body);
    out
}

fn read_frame(stream: &mut TcpStream) -> Vec<u8> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).expect("read request length prefix");
    let len = BigEndian::read_i32(&len_buf) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).expect("read request body");
    body
}

/// Spawns a listener that accepts connections in order, handing each one to
/// the matching closure in `handlers`. A handler reads whatever requests it
/// expects and writes back whatever frames it wants, then drops the stream.
fn spawn_mock_broker(mut handlers: Vec<Box<FnMut(TcpStream) + Send>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock broker listener");
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let stream = stream.expect("accept mock broker connection");
            if handlers.is_empty() {
                break;
            }
            let mut handler = handlers.remove(0);
            handler(stream);
            if handlers.is_empty() {
                break;
            }
        }
    });

    addr
}

fn metadata_response_body(correlation_id: i32, node_id: i32, addr: SocketAddr, topic: &str,
                          partitions: &[(i32, i32)]) -> Vec<u8> {
    let mut body = Vec::new();
    push_i32(&mut body, correlation_id);

    push_i32(&mut body, 1); // [broker] count
    push_i32(&mut body, node_id);
    push_str(&mut body, &addr.ip().to_string());
    push_i32(&mut body, addr.port() as i32);

    push_i32(&mut body, 1); // [topic_metadata] count
    push_i16(&mut body, 0); // topic error_code
    push_str(&mut body, topic);
    push_i32(&mut body, partitions.len() as i32);
    for &(partition_id, leader) in partitions {
        push_i16(&mut body, 0); // partition error_code
        push_i32(&mut body, partition_id);
        push_i32(&mut body, leader);
        push_i32(&mut body, 1); // [replicas]
        push_i32(&mut body, leader);
        push_i32(&mut body, 1); // [isr]
        push_i32(&mut body, leader);
    }

    body
}

#[test]
fn metadata_for_two_partition_topic() {
    let handler: Box<FnMut(TcpStream) + Send> = Box::new(move |mut stream: TcpStream| {
        let _req = read_frame(&mut stream);
        let body = metadata_response_body(0, 1, "127.0.0.1:0".parse().unwrap(), "orders",
                                          &[(0, 1), (1, 1)]);
        stream.write_all(&frame(body)).unwrap();
    });

    let addr = spawn_mock_broker(vec![handler]);

    let mut core = Core::new().unwrap();
    let config = ClientBuilder::from_hosts(vec![addr]).build();
    let client = KafkaClient::new(core.handle(), config);

    let resp = core.run(client.metadata(vec!["orders".to_owned()])).unwrap();

    assert_eq!(resp.topics.len(), 1);
    let topic = &resp.topics[0];
    assert_eq!(topic.topic_name, "orders");
    assert_eq!(topic.error_code, 0);
    assert_eq!(topic.partitions.len(), 2);

    let mut ids: Vec<i32> = topic.partitions.iter().map(|p| p.partition_id).collect();
    ids.sort();
    assert_eq!(ids, vec![0, 1]);
    assert!(topic.partitions.iter().all(|p| p.error_code == 0));
}

#[test]
fn produce_then_fetch_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock broker listener");
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        // Connection 1: metadata bootstrap, points the topic's leader back
        // at this same listener.
        let (mut conn, _) = listener.accept().expect("accept metadata connection");
        let _req = read_frame(&mut conn);
        let body = metadata_response_body(0, 1, addr, "orders", &[(1, 1)]);
        conn.write_all(&frame(body)).unwrap();
        drop(conn);

        // Connection 2: produce followed by fetch, pipelined on the same
        // socket, correlation ids 0 and 1 respectively.
        let (mut conn, _) = listener.accept().expect("accept produce/fetch connection");

        let produce_req = read_frame(&mut conn);

        // The message set is the tail of the request and carries no
        // element count of its own — just the one record's bytes.
        let mut expected_message_set = Vec::new();
        push_record(&mut expected_message_set, 0, Some(b"test key"), Some(b"test value"));
        assert!(produce_req.ends_with(&expected_message_set[..]),
                "produce request did not end with the bare message-set record \
                 (found a stray length prefix or other corruption before it)");

        let mut produce_body = Vec::new();
        push_i32(&mut produce_body, 0); // correlation_id
        push_i32(&mut produce_body, 1); // [topic] count
        push_str(&mut produce_body, "orders");
        push_i32(&mut produce_body, 1); // [partition] count
        push_i32(&mut produce_body, 1); // partition
        push_i16(&mut produce_body, 0); // error_code
        push_i64(&mut produce_body, 0); // offset
        conn.write_all(&frame(produce_body)).unwrap();

        let _fetch_req = read_frame(&mut conn);
        let mut message_set = Vec::new();
        push_record(&mut message_set, 0, Some(b"test key"), Some(b"test value"));

        let mut fetch_body = Vec::new();
        push_i32(&mut fetch_body, 1); // correlation_id
        push_i32(&mut fetch_body, 1); // [topic] count
        push_str(&mut fetch_body, "orders");
        push_i32(&mut fetch_body, 1); // [partition] count
        push_i32(&mut fetch_body, 1); // partition
        push_i16(&mut fetch_body, 0); // error_code
        push_i64(&mut fetch_body, 1); // highwater_mark_offset
        push_i32(&mut fetch_body, message_set.len() as i32);
        fetch_body.extend_from_slice(&message_set);
        conn.write_all(&frame(fetch_body)).unwrap();
    });

    let mut core = Core::new().unwrap();
    let config = ClientBuilder::from_hosts(vec![addr]).build();
    let client = KafkaClient::new(core.handle(), config);

    let message_set = MessageSet {
        messages: vec![Message {
            offset: 0,
            timestamp: Some(MessageTimestamp::CreateTime(0)),
            compression: Compression::None,
            key: Some(b"test key"[..].into()),
            value: Some(b"test value"[..].into()),
        }],
    };

    let produced = core.run(client.produce("orders", 1, message_set, RequiredAcks::One,
                                           Duration::from_secs(1)))
        .unwrap();
    assert_eq!(produced, Some(0));

    let fetched = core.run(client.fetch("orders", 1, 0, 1, 1024 * 1024, Duration::from_secs(1)))
        .unwrap();

    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].key.as_ref().map(|b| &b[..]), Some(&b"test key"[..]));
    assert_eq!(fetched[0].value.as_ref().map(|b| &b[..]), Some(&b"test value"[..]));
}

#[test]
fn stale_leader_error_does_not_wedge_the_router() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock broker listener");
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        // Connection 1: metadata bootstrap, triggered by `produce`'s
        // initial cache miss on the leader for (orders, 0).
        let (mut conn, _) = listener.accept().expect("accept metadata connection");
        let _req = read_frame(&mut conn);
        let body = metadata_response_body(0, 1, addr, "orders", &[(0, 1)]);
        conn.write_all(&frame(body)).unwrap();

        // Connection 2: the node-1 broker client dialed off that metadata.
        // It carries two pipelined requests: the produce that comes back
        // NotLeaderForPartition (correlation id 0), then the test's
        // explicit follow-up metadata call reusing the same connection
        // (correlation id 1) since the connection itself never errored.
        let (mut conn, _) = listener.accept().expect("accept broker connection");

        let _produce_req = read_frame(&mut conn);
        let mut produce_body = Vec::new();
        push_i32(&mut produce_body, 0); // correlation_id
        push_i32(&mut produce_body, 1);
        push_str(&mut produce_body, "orders");
        push_i32(&mut produce_body, 1);
        push_i32(&mut produce_body, 0); // partition
        push_i16(&mut produce_body, 6); // NotLeaderForPartition
        push_i64(&mut produce_body, -1); // offset
        conn.write_all(&frame(produce_body)).unwrap();

        let _metadata_req = read_frame(&mut conn);
        let metadata_body = metadata_response_body(1, 1, addr, "orders", &[(0, 1)]);
        conn.write_all(&frame(metadata_body)).unwrap();
    });

    let mut core = Core::new().unwrap();
    let config = ClientBuilder::from_hosts(vec![addr]).build();
    let client = KafkaClient::new(core.handle(), config);

    let message_set = MessageSet {
        messages: vec![Message {
            offset: 0,
            timestamp: Some(MessageTimestamp::CreateTime(0)),
            compression: Compression::None,
            key: None,
            value: Some(b"v"[..].into()),
        }],
    };

    let first = core.run(client.produce("orders", 0, message_set, RequiredAcks::One,
                                        Duration::from_secs(1)));
    assert!(first.is_err());

    // `metadata` always goes to the network (it is what populates the
    // cache in the first place), so this call landing on connection 3
    // above is expected either way. What it proves is that the earlier
    // eviction didn't leave the router wedged: a fresh round trip still
    // succeeds after a stale-leader failure.
    let resp = core.run(client.metadata(vec!["orders".to_owned()])).unwrap();
    assert_eq!(resp.topics[0].topic_name, "orders");
}

#[test]
fn correlation_id_mismatch_fails_pending_job() {
    let handler: Box<FnMut(TcpStream) + Send> = Box::new(move |mut stream: TcpStream| {
        let _req = read_frame(&mut stream);
        let mut body = Vec::new();
        push_i32(&mut body, 1); // correlation_id one greater than the request's 0
        push_i32(&mut body, 0); // arbitrary trailing bytes; never reached
        stream.write_all(&frame(body)).unwrap_or(());
    });

    let addr = spawn_mock_broker(vec![handler]);

    let mut core = Core::new().unwrap();
    let config = ClientBuilder::from_hosts(vec![addr]).build();
    let client = KafkaClient::new(core.handle(), config);

    let result = core.run(client.metadata(vec!["orders".to_owned()]));
    assert!(result.is_err());
}
