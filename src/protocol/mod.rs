use std::borrow::Cow;
use std::str;

use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32, IResult};

use errors::Result;

mod header;
mod metadata;
mod produce;
mod fetch;
mod offset;
mod offset_commit;
mod offset_fetch;
mod group_coordinator;
mod message;

pub use self::header::{RequestHeader, ResponseHeader, parse_response_header};
pub use self::metadata::{MetadataRequest, MetadataResponse, BrokerMetadata, TopicMetadata,
                          PartitionMetadata, parse_metadata_response};
pub use self::produce::{ProduceRequest, ProduceResponse, ProduceTopicData, ProducePartitionData,
                         ProduceTopicResponse, ProducePartitionResponse, parse_produce_response};
pub use self::fetch::{FetchRequest, FetchTopic, FetchPartition, FetchResponse, TopicData,
                       PartitionData, parse_fetch_response};
pub use self::offset::{OffsetRequest, OffsetTopic, OffsetPartition, OffsetResponse,
                        OffsetTopicResponse, OffsetPartitionResponse, parse_offset_response};
pub use self::offset_commit::{OffsetCommitRequest, OffsetCommitTopic, OffsetCommitPartition,
                               OffsetCommitResponse, OffsetCommitTopicResponse,
                               OffsetCommitPartitionResponse, parse_offset_commit_response};
pub use self::offset_fetch::{OffsetFetchRequest, OffsetFetchTopic, OffsetFetchResponse,
                              OffsetFetchTopicResponse, OffsetFetchPartitionResponse,
                              parse_offset_fetch_response};
pub use self::group_coordinator::{GroupCoordinatorRequest, GroupCoordinatorResponse,
                                   parse_group_coordinator_response};
pub use self::message::{Message, MessageSet, MessageSetEncoder, MessageTimestamp, parse_message_set};

/// A client-assigned integer echoed back by the broker to pair a response
/// with the request that produced it, scoped to one connection.
pub type CorrelationId = i32;
/// A broker-assigned node, partition or topic identifier.
pub type NodeId = i32;
/// A partition identifier within a topic.
pub type PartitionId = i32;
/// A message offset within a partition log.
pub type Offset = i64;
/// Millisecond timestamp, as reported on the wire.
pub type Timestamp = i64;
/// The numeric code identifying the kind of request (`ApiKeys as ApiKey`).
pub type ApiKey = i16;
/// The per-request protocol version, as sent in the request header.
pub type ApiVersion = i16;
/// The raw error code reported in a response, before classification.
pub type ErrorCode = i16;

/// The numeric codes that the `ApiKey` field of a request header can take.
///
/// Only the request types this client actually issues are listed; a broker
/// may support others we never construct.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i16)]
pub enum ApiKeys {
    Produce = 0,
    Fetch = 1,
    Offsets = 2,
    Metadata = 3,
    OffsetCommit = 8,
    OffsetFetch = 9,
    GroupCoordinator = 10,
}

/// Possible choices on acknowledgement requirements when producing
/// messages to a partition leader. See `KafkaClient::produce`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequiredAcks {
    /// Fire-and-forget: the broker does not acknowledge the write at all.
    None,
    /// Wait until the partition leader has written the messages to its log.
    One,
    /// Wait until every in-sync replica has acknowledged the messages.
    All,
}

impl From<RequiredAcks> for i16 {
    fn from(acks: RequiredAcks) -> i16 {
        match acks {
            RequiredAcks::None => 0,
            RequiredAcks::One => 1,
            RequiredAcks::All => -1,
        }
    }
}

impl From<i16> for RequiredAcks {
    fn from(v: i16) -> Self {
        match v {
            0 => RequiredAcks::None,
            -1 => RequiredAcks::All,
            _ => RequiredAcks::One,
        }
    }
}

/// Special offset values recognized by the `Offset` (list offsets) API.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchOffset {
    /// The offset of the next message that would be appended.
    Latest,
    /// The offset of the oldest message still retained.
    Earliest,
    /// Request offsets as of a specific broker-local timestamp, in ms.
    ByTime(Timestamp),
}

impl From<FetchOffset> for Timestamp {
    fn from(offset: FetchOffset) -> Timestamp {
        match offset {
            FetchOffset::Latest => -1,
            FetchOffset::Earliest => -2,
            FetchOffset::ByTime(ts) => ts,
        }
    }
}

/// A value that can be serialized onto the wire as a request body.
pub trait Encodable {
    fn encode<T: ByteOrder>(self, dst: &mut BytesMut) -> Result<()>;
}

/// Extension methods for writing Kafka's length-prefixed primitives onto a
/// `BytesMut`, mirroring the `nom` parsers below on the decode side.
pub trait WriteExt {
    fn put_str<T: ByteOrder, S: AsRef<str>>(&mut self, s: Option<S>) -> Result<()>;
    fn put_bytes<T: ByteOrder, B: AsRef<[u8]>>(&mut self, b: Option<B>) -> Result<()>;
    fn put_array<I, F>(&mut self, items: Vec<I>, f: F) -> Result<()>
        where F: FnMut(&mut BytesMut, I) -> Result<()>;
}

impl WriteExt for BytesMut {
    fn put_str<T: ByteOrder, S: AsRef<str>>(&mut self, s: Option<S>) -> Result<()> {
        match s {
            Some(s) => {
                let s = s.as_ref();
                if s.len() > i16::max_value() as usize {
                    bail!(::errors::ErrorKind::CodecError("string too long to encode"));
                }
                self.put_i16::<T>(s.len() as i16);
                self.put_slice(s.as_bytes());
            }
            None => self.put_i16::<T>(-1),
        }
        Ok(())
    }

    fn put_bytes<T: ByteOrder, B: AsRef<[u8]>>(&mut self, b: Option<B>) -> Result<()> {
        match b {
            Some(b) => {
                let b = b.as_ref();
                if b.len() > i32::max_value() as usize {
                    bail!(::errors::ErrorKind::CodecError("byte array too long to encode"));
                }
                self.put_i32::<T>(b.len() as i32);
                self.put_slice(b);
            }
            None => self.put_i32::<T>(-1),
        }
        Ok(())
    }

    fn put_array<I, F>(&mut self, items: Vec<I>, mut f: F) -> Result<()>
        where F: FnMut(&mut BytesMut, I) -> Result<()>
    {
        self.put_i32::<::bytes::BigEndian>(items.len() as i32);
        for item in items {
            f(self, item)?;
        }
        Ok(())
    }
}

/// A label attached to a parser so decode failures can report which
/// structure they occurred in, rather than just a raw nom `ErrorKind`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseTag {
    RequestHeader,
    ResponseHeader,
    MetadataResponse,
    MetadataBrokers,
    MetadataTopics,
    MetadataPartitions,
    ProduceResponse,
    ProduceTopics,
    ProducePartitions,
    FetchTopics,
    FetchPartitions,
    OffsetResponse,
    OffsetTopics,
    OffsetPartitions,
    OffsetCommitResponse,
    OffsetFetchResponse,
    GroupCoordinatorResponse,
    MessageSet,
    Message,
    MessageCrc,
}

macro_rules! parse_tag {
    ($i:expr, $tag:expr, $submac:ident!( $($args:tt)* )) => {
        $submac!($i, $($args)*)
    };
    ($i:expr, $tag:expr, $f:expr) => {
        call!($i, $f)
    };
}

named!(pub parse_str<Option<Cow<str>>>,
    do_parse!(
        len: be_i16
     >> s: cond!(len > 0, map!(map_res!(take!(len), str::from_utf8), Cow::from))
     >> (s)
    )
);

named!(pub parse_string<String>,
    do_parse!(
        len: be_i16
     >> s: cond_reduce!(len > 0, map!(map_res!(take!(len), str::from_utf8), ToOwned::to_owned))
     >> (s)
    )
);

named!(pub parse_bytes<Option<Cow<[u8]>>>,
    do_parse!(
        len: be_i32
     >> s: cond!(len > 0, map!(take!(len), Cow::from))
     >> (s)
    )
);

/// Decodes a complete response of type `T` from a length-delimited frame
/// already stripped of its leading size prefix, erroring on trailing bytes.
pub fn decode_exact<T, F>(input: &[u8], parser: F) -> Result<T>
    where F: Fn(&[u8]) -> IResult<&[u8], T>
{
    match parser(input) {
        IResult::Done(rest, value) => {
            if !rest.is_empty() {
                bail!(::errors::ErrorKind::CodecError("trailing bytes after response"));
            }
            Ok(value)
        }
        IResult::Incomplete(_) => {
            bail!(::errors::ErrorKind::CodecError("response shorter than expected"));
        }
        IResult::Error(_) => {
            bail!(::errors::ErrorKind::CodecError("malformed response"));
        }
    }
}

#[cfg(test)]
mod tests {
    use nom::{IResult, Needed, ErrorKind};

    use super::*;

    #[test]
    fn test_parse_str() {
        assert_eq!(parse_str(b"\0"), IResult::Incomplete(Needed::Size(2)));
        assert_eq!(parse_str(b"\xff\xff"), IResult::Done(&b""[..], None));
        assert_eq!(parse_str(b"\0\0"), IResult::Done(&b""[..], None));
        assert_eq!(parse_str(b"\0\x04test"),
                   IResult::Done(&b""[..], Some(Cow::from("test"))));
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(parse_string(b"\0"), IResult::Incomplete(Needed::Size(2)));
        assert_eq!(parse_string(b"\xff\xff"),
                   IResult::Error(ErrorKind::CondReduce));
        assert_eq!(parse_string(b"\0\0"), IResult::Error(ErrorKind::CondReduce));
        assert_eq!(parse_string(b"\0\x04test"),
                   IResult::Done(&b""[..], "test".to_owned()));
    }

    #[test]
    fn test_parse_bytes() {
        assert_eq!(parse_bytes(b"\0"), IResult::Incomplete(Needed::Size(4)));
        assert_eq!(parse_bytes(b"\xff\xff\xff\xff"),
                   IResult::Done(&b""[..], None));
        assert_eq!(parse_bytes(b"\0\0\0\0"), IResult::Done(&b""[..], None));
        assert_eq!(parse_bytes(b"\0\0\0\x04test"),
                   IResult::Done(&b""[..], Some(Cow::from(&b"test"[..]))));
    }

    #[test]
    fn test_required_acks_roundtrip() {
        assert_eq!(i16::from(RequiredAcks::None), 0);
        assert_eq!(i16::from(RequiredAcks::One), 1);
        assert_eq!(i16::from(RequiredAcks::All), -1);
        assert_eq!(RequiredAcks::from(0i16), RequiredAcks::None);
        assert_eq!(RequiredAcks::from(-1i16), RequiredAcks::All);
        assert_eq!(RequiredAcks::from(1i16), RequiredAcks::One);
    }

    #[test]
    fn test_fetch_offset() {
        assert_eq!(Timestamp::from(FetchOffset::Latest), -1);
        assert_eq!(Timestamp::from(FetchOffset::Earliest), -2);
        assert_eq!(Timestamp::from(FetchOffset::ByTime(42)), 42);
    }
}
