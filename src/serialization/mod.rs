use std::marker::PhantomData;

use bytes::{Buf, BufMut, Bytes, IntoBuf};

use errors::{Error, ErrorKind};

/// Serializes a record's key or value into the bytes that go on the
/// wire. `KafkaProducer` deals only in `Bytes`; this lets callers work
/// in whatever type is natural for them and convert once, right before
/// handing a record to `send`.
pub trait Serializer {
    type Item;
    type Error;

    fn serialize_to<B: BufMut>(&self, topic_name: &str, data: &Self::Item, buf: &mut B) -> Result<(), Self::Error>;

    fn serialize(&self, topic_name: &str, data: &Self::Item) -> Result<Bytes, Self::Error> {
        let mut buf = Vec::new();
        self.serialize_to(topic_name, data, &mut buf)?;
        Ok(Bytes::from(buf))
    }
}

/// Deserializes a record's key or value out of the bytes read off the
/// wire.
pub trait Deserializer {
    type Item;
    type Error;

    fn deserialize<B: Buf>(&self, topic_name: &str, buf: B) -> Result<Self::Item, Self::Error>;
}

/// Passes `Bytes` through untouched.
#[derive(Clone, Copy, Default, Debug)]
pub struct BytesSerializer;

impl Serializer for BytesSerializer {
    type Item = Bytes;
    type Error = Error;

    fn serialize_to<B: BufMut>(&self, _topic_name: &str, data: &Bytes, buf: &mut B) -> Result<(), Error> {
        buf.put_slice(data.as_ref());
        Ok(())
    }
}

impl Deserializer for BytesSerializer {
    type Item = Bytes;
    type Error = Error;

    fn deserialize<B: Buf>(&self, _topic_name: &str, mut buf: B) -> Result<Bytes, Error> {
        Ok(buf.collect())
    }
}

/// Drops whatever is serialized, produces an empty buffer deserialized.
/// Useful for the key half of a record that carries no key.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoopSerializer;

impl Serializer for NoopSerializer {
    type Item = ();
    type Error = Error;

    fn serialize_to<B: BufMut>(&self, _topic_name: &str, _data: &(), _buf: &mut B) -> Result<(), Error> {
        Ok(())
    }
}

impl Deserializer for NoopSerializer {
    type Item = ();
    type Error = Error;

    fn deserialize<B: Buf>(&self, _topic_name: &str, _buf: B) -> Result<(), Error> {
        Ok(())
    }
}

/// Serializes a raw byte slice (`&[u8]`/`Vec<u8>`), borrowing rather
/// than copying where `serialize_to` allows it.
#[derive(Clone, Copy, Default, Debug)]
pub struct RawSerializer<T>(PhantomData<T>);

impl<T> RawSerializer<T> {
    pub fn new() -> Self {
        RawSerializer(PhantomData)
    }
}

impl<T> Serializer for RawSerializer<T>
    where T: AsRef<[u8]>
{
    type Item = T;
    type Error = Error;

    fn serialize_to<B: BufMut>(&self, _topic_name: &str, data: &T, buf: &mut B) -> Result<(), Error> {
        buf.put_slice(data.as_ref());
        Ok(())
    }
}

impl Deserializer for RawSerializer<Vec<u8>> {
    type Item = Vec<u8>;
    type Error = Error;

    fn deserialize<B: Buf>(&self, _topic_name: &str, mut buf: B) -> Result<Vec<u8>, Error> {
        Ok(buf.collect())
    }
}

/// Serializes/deserializes a UTF-8 `String`.
#[derive(Clone, Copy, Default, Debug)]
pub struct StringSerializer;

impl Serializer for StringSerializer {
    type Item = String;
    type Error = Error;

    fn serialize_to<B: BufMut>(&self, _topic_name: &str, data: &String, buf: &mut B) -> Result<(), Error> {
        buf.put_slice(data.as_bytes());
        Ok(())
    }
}

impl Deserializer for StringSerializer {
    type Item = String;
    type Error = Error;

    fn deserialize<B: Buf>(&self, topic_name: &str, mut buf: B) -> Result<String, Error> {
        let bytes: Vec<u8> = buf.collect();

        String::from_utf8(bytes).map_err(|_| {
            ErrorKind::CodecError("record value is not valid UTF-8").into()
        }).map_err(|err: Error| {
            debug!("failed to decode record value for topic {} as UTF-8", topic_name);
            err
        })
    }
}
