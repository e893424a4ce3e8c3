//! Typed dispatch over the handful of request/response pairs this client
//! issues. A `Connection` deals only in `KafkaRequest`/`KafkaResponse` plus
//! a correlation id; it has no notion of what a Metadata or Fetch call
//! means semantically, that lives in `protocol`.

use bytes::{BigEndian, BytesMut};

use errors::{ErrorKind, Result};
use protocol::{ApiKey, ApiKeys, ApiVersion, CorrelationId, Encodable, FetchRequest,
               FetchResponse, GroupCoordinatorRequest, GroupCoordinatorResponse, MetadataRequest,
               MetadataResponse, OffsetCommitRequest, OffsetCommitResponse, OffsetFetchRequest,
               OffsetFetchResponse, OffsetRequest, OffsetResponse, ProduceRequest,
               ProduceResponse, decode_exact, parse_fetch_response, parse_group_coordinator_response,
               parse_metadata_response, parse_offset_commit_response, parse_offset_fetch_response,
               parse_offset_response, parse_produce_response};

/// A request this client can send, tagged by which typed body it carries.
/// The embedded `RequestHeader.correlation_id` is a placeholder until
/// `encode` is called by the connection's send loop, which is the only
/// place allowed to assign the real, connection-scoped id.
#[derive(Clone, Debug, PartialEq)]
pub enum KafkaRequest {
    Metadata(MetadataRequest<'static>),
    Produce(ProduceRequest),
    Fetch(FetchRequest),
    Offset(OffsetRequest),
    OffsetCommit(OffsetCommitRequest),
    OffsetFetch(OffsetFetchRequest),
    GroupCoordinator(GroupCoordinatorRequest),
}

impl KafkaRequest {
    pub fn api_key(&self) -> ApiKey {
        match *self {
            KafkaRequest::Metadata(_) => ApiKeys::Metadata as ApiKey,
            KafkaRequest::Produce(_) => ApiKeys::Produce as ApiKey,
            KafkaRequest::Fetch(_) => ApiKeys::Fetch as ApiKey,
            KafkaRequest::Offset(_) => ApiKeys::Offsets as ApiKey,
            KafkaRequest::OffsetCommit(_) => ApiKeys::OffsetCommit as ApiKey,
            KafkaRequest::OffsetFetch(_) => ApiKeys::OffsetFetch as ApiKey,
            KafkaRequest::GroupCoordinator(_) => ApiKeys::GroupCoordinator as ApiKey,
        }
    }

    pub fn api_version(&self) -> ApiVersion {
        match *self {
            KafkaRequest::Metadata(ref req) => req.header.api_version,
            KafkaRequest::Produce(ref req) => req.header.api_version,
            KafkaRequest::Fetch(ref req) => req.header.api_version,
            KafkaRequest::Offset(ref req) => req.header.api_version,
            KafkaRequest::OffsetCommit(ref req) => req.header.api_version,
            KafkaRequest::OffsetFetch(ref req) => req.header.api_version,
            KafkaRequest::GroupCoordinator(ref req) => req.header.api_version,
        }
    }

    /// The decoder the send loop should queue for this request's reply,
    /// or `None` for a request that never provokes one (Produce sent
    /// with `RequiredAcks::None`). The send loop completes a no-reply
    /// job right after the write succeeds instead of queueing it.
    pub fn decoder(&self) -> Result<Option<ResponseDecoder>> {
        if let KafkaRequest::Produce(ref req) = *self {
            if req.required_acks == 0 {
                return Ok(None);
            }
        }

        response_decoder(self.api_key(), self.api_version()).map(Some)
    }

    fn set_correlation_id(&mut self, correlation_id: CorrelationId) {
        macro_rules! set {
            ($req:expr) => {
                $req.header.correlation_id = correlation_id
            }
        }

        match *self {
            KafkaRequest::Metadata(ref mut req) => set!(req),
            KafkaRequest::Produce(ref mut req) => set!(req),
            KafkaRequest::Fetch(ref mut req) => set!(req),
            KafkaRequest::Offset(ref mut req) => set!(req),
            KafkaRequest::OffsetCommit(ref mut req) => set!(req),
            KafkaRequest::OffsetFetch(ref mut req) => set!(req),
            KafkaRequest::GroupCoordinator(ref mut req) => set!(req),
        }
    }

    /// Assigns `correlation_id` and serializes the request body (without
    /// the outer length prefix; the connection adds that when framing).
    pub fn encode(mut self, correlation_id: CorrelationId) -> Result<BytesMut> {
        self.set_correlation_id(correlation_id);

        let mut buf = BytesMut::with_capacity(256);

        match self {
            KafkaRequest::Metadata(req) => req.encode::<BigEndian>(&mut buf)?,
            KafkaRequest::Produce(req) => req.encode::<BigEndian>(&mut buf)?,
            KafkaRequest::Fetch(req) => req.encode::<BigEndian>(&mut buf)?,
            KafkaRequest::Offset(req) => req.encode::<BigEndian>(&mut buf)?,
            KafkaRequest::OffsetCommit(req) => req.encode::<BigEndian>(&mut buf)?,
            KafkaRequest::OffsetFetch(req) => req.encode::<BigEndian>(&mut buf)?,
            KafkaRequest::GroupCoordinator(req) => req.encode::<BigEndian>(&mut buf)?,
        }

        Ok(buf)
    }
}

/// A decoded reply, tagged the same way as the request that caused it.
#[derive(Clone, Debug, PartialEq)]
pub enum KafkaResponse {
    Metadata(MetadataResponse),
    Produce(ProduceResponse),
    Fetch(FetchResponse),
    Offset(OffsetResponse),
    OffsetCommit(OffsetCommitResponse),
    OffsetFetch(OffsetFetchResponse),
    GroupCoordinator(GroupCoordinatorResponse),
}

impl KafkaResponse {
    pub fn api_key(&self) -> ApiKey {
        match *self {
            KafkaResponse::Metadata(_) => ApiKeys::Metadata as ApiKey,
            KafkaResponse::Produce(_) => ApiKeys::Produce as ApiKey,
            KafkaResponse::Fetch(_) => ApiKeys::Fetch as ApiKey,
            KafkaResponse::Offset(_) => ApiKeys::Offsets as ApiKey,
            KafkaResponse::OffsetCommit(_) => ApiKeys::OffsetCommit as ApiKey,
            KafkaResponse::OffsetFetch(_) => ApiKeys::OffsetFetch as ApiKey,
            KafkaResponse::GroupCoordinator(_) => ApiKeys::GroupCoordinator as ApiKey,
        }
    }
}

/// A job's caller-supplied means of turning a response body (everything
/// after the 4-byte correlation id) into a typed `KafkaResponse`. Built
/// once per request from the api key/version the request was sent with.
pub type ResponseDecoder = Box<Fn(&[u8]) -> Result<KafkaResponse>>;

/// Builds the decoder for the reply to a request of this shape. Returns
/// `None` for requests that never get a reply (see `expects_response`).
pub fn response_decoder(api_key: ApiKey, api_version: ApiVersion) -> Result<ResponseDecoder> {
    if api_key == ApiKeys::Metadata as ApiKey {
        Ok(Box::new(move |body| {
            decode_exact(body, parse_metadata_response).map(KafkaResponse::Metadata)
        }))
    } else if api_key == ApiKeys::Produce as ApiKey {
        Ok(Box::new(move |body| {
            decode_exact(body, |i| parse_produce_response(i, api_version)).map(KafkaResponse::Produce)
        }))
    } else if api_key == ApiKeys::Fetch as ApiKey {
        Ok(Box::new(move |body| {
            decode_exact(body, |i| parse_fetch_response(i, api_version)).map(KafkaResponse::Fetch)
        }))
    } else if api_key == ApiKeys::Offsets as ApiKey {
        Ok(Box::new(move |body| {
            decode_exact(body, parse_offset_response).map(KafkaResponse::Offset)
        }))
    } else if api_key == ApiKeys::OffsetCommit as ApiKey {
        Ok(Box::new(move |body| {
            decode_exact(body, parse_offset_commit_response).map(KafkaResponse::OffsetCommit)
        }))
    } else if api_key == ApiKeys::OffsetFetch as ApiKey {
        Ok(Box::new(move |body| {
            decode_exact(body, parse_offset_fetch_response).map(KafkaResponse::OffsetFetch)
        }))
    } else if api_key == ApiKeys::GroupCoordinator as ApiKey {
        Ok(Box::new(move |body| {
            decode_exact(body, parse_group_coordinator_response).map(KafkaResponse::GroupCoordinator)
        }))
    } else {
        bail!(ErrorKind::UnexpectedResponse(api_key))
    }
}
