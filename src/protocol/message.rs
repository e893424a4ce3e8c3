use bytes::{BigEndian, BufMut, ByteOrder, Bytes, BytesMut};

use nom::IResult;

use time;

use crc::crc32;

use errors::{ErrorKind, Result};
use compression::Compression;
use protocol::{ApiVersion, Offset, Timestamp, WriteExt};

pub const TIMESTAMP_TYPE_MASK: i8 = 0x08;
pub const COMPRESSION_CODEC_MASK: i8 = 0x07;

/// Size of the fixed `Offset MessageSize` prefix that precedes every
/// record in a message set, before the CRC-protected message body.
const RECORD_PREFIX_LEN: usize = 8 + 4;
/// Size of the `Crc MagicByte Attributes` header inside a message body.
const MESSAGE_HEADER_LEN: usize = 4 + 1 + 1;

/// Message sets
///
/// One structure common to both the produce and fetch requests is the message set format.
/// A message in kafka is a key-value pair with a small amount of associated metadata.
/// A message set is just a sequence of messages with offset and size information.
/// This format happens to be used both for the on-disk storage on the broker and the on-the-wire format.
///
/// MessageSet => [Offset MessageSize Message]
///   Offset => int64
///   MessageSize => int32
///
/// Unlike most other request/response structures, a message set is *not*
/// preceded by an element count: its extent is known from the enclosing
/// length-prefixed field, and the last record may be truncated if the
/// broker cut a fetch response short.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageSet {
    pub messages: Vec<Message>,
}

/// Message format
///
/// v0
/// Message => Crc MagicByte Attributes Key Value
///   Crc => int32
///   MagicByte => int8
///   Attributes => int8
///   Key => bytes
///   Value => bytes
///
/// v1 (supported since 0.10.0)
/// Message => Crc MagicByte Attributes Timestamp Key Value
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub offset: Offset,
    pub timestamp: Option<MessageTimestamp>,
    pub compression: Compression,
    pub key: Option<Bytes>,
    pub value: Option<Bytes>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessageTimestamp {
    CreateTime(Timestamp),
    LogAppendTime(Timestamp),
}

impl MessageTimestamp {
    pub fn value(&self) -> Timestamp {
        match self {
            &MessageTimestamp::CreateTime(v) |
            &MessageTimestamp::LogAppendTime(v) => v,
        }
    }
}

impl Default for MessageTimestamp {
    fn default() -> Self {
        let ts = time::now_utc().to_timespec();

        MessageTimestamp::CreateTime(ts.sec * 1000_000 + ts.nsec as Timestamp / 1000)
    }
}

pub struct MessageSetEncoder {
    api_version: ApiVersion,
}

impl MessageSetEncoder {
    pub fn new(api_version: ApiVersion) -> Self {
        MessageSetEncoder { api_version: api_version }
    }

    pub fn encode<T: ByteOrder>(&self, message_set: MessageSet, buf: &mut BytesMut) -> Result<()> {
        let mut offset: Offset = 0;

        // Unlike a Kafka array, a message set carries no element count:
        // records are written back-to-back and its extent is bounded by
        // the enclosing length-prefixed field, mirroring
        // `decode_message_set`'s read side.
        for message in message_set.messages {
            let record_offset = if message.compression == Compression::None {
                message.offset
            } else {
                offset = offset.wrapping_add(1);
                offset - 1
            };

            self.encode_message::<T>(message, record_offset, buf)?;
        }

        Ok(())
    }

    fn encode_message<T: ByteOrder>(&self,
                                    message: Message,
                                    offset: Offset,
                                    buf: &mut BytesMut)
                                    -> Result<()> {
        buf.put_i64::<T>(offset);
        let size_off = buf.len();
        buf.put_i32::<T>(0);
        let crc_off = buf.len();
        buf.put_i32::<T>(0);
        let data_off = buf.len();
        buf.put_i8(self.api_version as i8);
        buf.put_i8((message.compression as i8 & COMPRESSION_CODEC_MASK) |
                   if let Some(MessageTimestamp::LogAppendTime(_)) = message.timestamp {
                       TIMESTAMP_TYPE_MASK
                   } else {
                       0
                   });

        if self.api_version > 0 {
            buf.put_i64::<T>(message.timestamp.unwrap_or_default().value());
        }

        buf.put_bytes::<T, _>(message.key)?;
        buf.put_bytes::<T, _>(message.value)?;

        let size = buf.len() - crc_off;
        let crc = crc32::checksum_ieee(&buf[data_off..]);

        T::write_i32(&mut buf[size_off..], size as i32);
        T::write_i32(&mut buf[crc_off..], crc as i32);

        Ok(())
    }
}

/// Decodes a message set occupying exactly `input`, flattening one level
/// of compression so that every yielded `Message` is a plain record with
/// the offset the broker assigned it.
///
/// Per the wire format, a message set carries no element count: we walk
/// `input` record by record until fewer than `RECORD_PREFIX_LEN` bytes
/// remain, or until the declared message size would run past the end of
/// `input`. Kafka truncates the last record of a fetch response rather
/// than splitting it across responses, so a short trailing record is not
/// an error: decoding simply stops there.
pub fn parse_message_set(input: &[u8], api_version: ApiVersion) -> IResult<&[u8], MessageSet> {
    match decode_message_set(input, api_version) {
        Ok(messages) => IResult::Done(&input[input.len()..], MessageSet { messages: messages }),
        Err(_) => IResult::Error(::nom::ErrorKind::Custom(1)),
    }
}

fn decode_message_set(input: &[u8], api_version: ApiVersion) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    let mut rest = input;

    while rest.len() >= RECORD_PREFIX_LEN {
        let offset = BigEndian::read_i64(rest);
        let size = BigEndian::read_i32(&rest[8..]);

        if size < 0 {
            bail!(ErrorKind::CodecError("negative message size"));
        }

        let size = size as usize;

        if rest.len() < RECORD_PREFIX_LEN + size {
            // The broker truncated the last record of a fetch response;
            // stop cleanly instead of erroring on the partial tail.
            break;
        }

        let body = &rest[RECORD_PREFIX_LEN..RECORD_PREFIX_LEN + size];

        decode_message(body, offset, api_version, &mut messages)?;

        rest = &rest[RECORD_PREFIX_LEN + size..];
    }

    Ok(messages)
}

fn decode_message(body: &[u8],
                  offset: Offset,
                  api_version: ApiVersion,
                  out: &mut Vec<Message>)
                  -> Result<()> {
    if body.len() < MESSAGE_HEADER_LEN {
        bail!(ErrorKind::CodecError("message shorter than its fixed header"));
    }

    let crc = BigEndian::read_u32(body);
    let computed = crc32::checksum_ieee(&body[4..]);

    if crc != computed {
        bail!(ErrorKind::CodecError("message CRC mismatch"));
    }

    let magic = body[4] as i8;
    let attrs = body[5] as i8;
    let mut cursor = 6;

    let timestamp = if api_version > 0 || magic > 0 {
        if body.len() < cursor + 8 {
            bail!(ErrorKind::CodecError("message truncated before timestamp"));
        }
        let ts = BigEndian::read_i64(&body[cursor..]);
        cursor += 8;
        Some(if (attrs & TIMESTAMP_TYPE_MASK) == 0 {
                 MessageTimestamp::CreateTime(ts)
             } else {
                 MessageTimestamp::LogAppendTime(ts)
             })
    } else {
        None
    };

    let (key, cursor) = parse_owned_bytes(body, cursor)?;
    let (value, _cursor) = parse_owned_bytes(body, cursor)?;

    let compression = Compression::from(attrs & COMPRESSION_CODEC_MASK);

    if compression == Compression::None {
        out.push(Message {
                     offset: offset,
                     timestamp: timestamp,
                     compression: compression,
                     key: key,
                     value: value,
                 });
    } else {
        // A compressed record's value is itself a serialized message set;
        // flatten it one level, keeping the offsets the broker assigned
        // to the inner records.
        let inner = value.ok_or_else(|| ErrorKind::CodecError("compressed message has no value"))?;
        let decompressed = compression.decompress(&inner)?;
        let inner_messages = decode_message_set(&decompressed, api_version)?;

        out.extend(inner_messages);
    }

    Ok(())
}

fn parse_owned_bytes(body: &[u8], cursor: usize) -> Result<(Option<Bytes>, usize)> {
    if body.len() < cursor + 4 {
        bail!(ErrorKind::CodecError("message truncated before length"));
    }

    let len = BigEndian::read_i32(&body[cursor..]);
    let cursor = cursor + 4;

    if len < 0 {
        return Ok((None, cursor));
    }

    let len = len as usize;

    if body.len() < cursor + len {
        bail!(ErrorKind::CodecError("message truncated before declared bytes"));
    }

    Ok((Some(Bytes::from(&body[cursor..cursor + len])), cursor + len))
}

#[cfg(test)]
mod tests {
    use bytes::{BigEndian, BytesMut};

    use super::*;

    fn encode_v0(offset: Offset, key: Option<&[u8]>, value: Option<&[u8]>) -> BytesMut {
        let mut buf = BytesMut::with_capacity(64);
        let encoder = MessageSetEncoder::new(0);

        encoder
            .encode::<BigEndian>(MessageSet {
                                     messages: vec![Message {
                                                        offset: offset,
                                                        timestamp: None,
                                                        compression: Compression::None,
                                                        key: key.map(Bytes::from),
                                                        value: value.map(Bytes::from),
                                                    }],
                                 },
                                 &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn test_roundtrip_single_message() {
        let buf = encode_v0(42, Some(b"key"), Some(b"value"));

        let messages = decode_message_set(&buf, 0).unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].offset, 42);
        assert_eq!(messages[0].key.as_ref().map(|b| &b[..]), Some(&b"key"[..]));
        assert_eq!(messages[0].value.as_ref().map(|b| &b[..]), Some(&b"value"[..]));
    }

    #[test]
    fn test_crc_mismatch_is_fatal() {
        let buf = encode_v0(0, None, Some(b"value"));
        let mut body = buf.to_vec();

        // corrupt a byte inside the value, invalidating the CRC.
        let last = body.len() - 1;
        body[last] ^= 0xff;

        assert!(decode_message_set(&body, 0).is_err());
    }

    #[test]
    fn test_truncated_trailing_record_is_dropped_silently() {
        let mut first = encode_v0(0, None, Some(b"one")).to_vec();
        let second = encode_v0(1, None, Some(b"two-longer-value")).to_vec();

        first.extend_from_slice(&second[..second.len() - 5]);

        let messages = decode_message_set(&first, 0).unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].offset, 0);
    }

    #[test]
    fn test_compressed_message_is_flattened() {
        let mut inner = encode_v0(0, None, Some(b"a")).to_vec();
        inner.extend_from_slice(&encode_v0(1, None, Some(b"b")));

        let mut buf = BytesMut::with_capacity(64);
        let encoder = MessageSetEncoder::new(0);

        encoder
            .encode::<BigEndian>(MessageSet {
                                     messages: vec![Message {
                                                        offset: 0,
                                                        timestamp: None,
                                                        compression: Compression::Gzip,
                                                        key: None,
                                                        value: Some(Bytes::from(Compression::Gzip
                                                                                    .compress(&inner)
                                                                                    .unwrap())),
                                                    }],
                                 },
                                 &mut buf)
            .unwrap();

        let messages = decode_message_set(&buf, 0).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].value.as_ref().map(|b| &b[..]), Some(&b"a"[..]));
        assert_eq!(messages[1].value.as_ref().map(|b| &b[..]), Some(&b"b"[..]));
    }
}
