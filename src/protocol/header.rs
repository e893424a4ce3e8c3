use std::borrow::Cow;

use bytes::{BufMut, ByteOrder, BytesMut};

use nom::be_i32;

use errors::Result;
use protocol::{ApiKey, ApiVersion, Encodable, WriteExt};

/// RequestHeader => api_key api_version correlation_id client_id
///   api_key => int16
///   api_version => int16
///   correlation_id => int32
///   client_id => string
#[derive(Clone, Debug, PartialEq)]
pub struct RequestHeader<'a> {
    /// The id of the request type.
    pub api_key: ApiKey,
    /// The version of the API.
    pub api_version: ApiVersion,
    /// A user-supplied integer value that will be passed back with the
    /// response, used to match responses to requests on a pipelined
    /// connection.
    pub correlation_id: i32,
    /// A user specified identifier for the client making the request.
    pub client_id: Option<Cow<'a, str>>,
}

/// ResponseHeader => correlation_id
///   correlation_id => int32
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResponseHeader {
    pub correlation_id: i32,
}

impl<'a> Encodable for RequestHeader<'a> {
    fn encode<T: ByteOrder>(self, dst: &mut BytesMut) -> Result<()> {
        dst.put_i16::<T>(self.api_key);
        dst.put_i16::<T>(self.api_version);
        dst.put_i32::<T>(self.correlation_id);
        dst.put_str::<T, _>(self.client_id)?;
        Ok(())
    }
}

named!(pub parse_response_header<ResponseHeader>,
    map!(be_i32, |correlation_id| ResponseHeader { correlation_id: correlation_id })
);
