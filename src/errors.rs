use protocol::ApiKey;

/// Various errors reported by a remote Kafka broker.
///
/// We use numeric codes to indicate what problem occurred on the server.
/// These can be translated by the client into exceptions or whatever the
/// appropriate error handling mechanism in the client language is.
///
/// See also [Kafka Errors](http://kafka.apache.org/protocol.html)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KafkaCode {
    /// The server experienced an unexpected error when processing the request
    Unknown,
    None,
    /// The requested offset is outside the range of offsets
    /// maintained by the server for the given topic/partition
    OffsetOutOfRange,
    /// This indicates that a message contents does not match its CRC
    CorruptMessage,
    /// This request is for a topic or partition that does not exist
    /// on this broker.
    UnknownTopicOrPartition,
    /// The message has a negative size
    InvalidMessageSize,
    /// This error is thrown if we are in the middle of a leadership
    /// election and there is currently no leader for this partition
    /// and hence it is unavailable for writes.
    LeaderNotAvailable,
    /// This error is thrown if the client attempts to send messages
    /// to a replica that is not the leader for some partition. It
    /// indicates that the client's metadata is out of date.
    NotLeaderForPartition,
    /// This error is thrown if the request exceeds the user-specified
    /// time limit in the request.
    RequestTimedOut,
    /// This is not a client facing error and is used mostly by tools
    /// when a broker is not alive.
    BrokerNotAvailable,
    /// If replica is expected on a broker, but is not (this can be
    /// safely ignored).
    ReplicaNotAvailable,
    /// The server has a configurable maximum message size to avoid
    /// unbounded memory allocation. This error is thrown if the
    /// client attempts to produce a message larger than this maximum.
    MessageSizeTooLarge,
    /// Internal error code for broker-to-broker communication.
    StaleControllerEpoch,
    /// If you specify a string larger than configured maximum for
    /// offset metadata.
    OffsetMetadataTooLarge,
    /// The server disconnected before a response was received.
    NetworkException,
    /// The broker returns this error code for an offset fetch request
    /// if it is still loading offsets (after a leader change for that
    /// offsets topic partition), or in response to group membership
    /// requests when group metadata is being loaded by the coordinator.
    GroupLoadInProgress,
    /// The broker returns this error code for group coordinator
    /// requests, offset commits, and most group management requests
    /// if the offsets topic has not yet been created, or if the group
    /// coordinator is not active.
    GroupCoordinatorNotAvailable,
    /// The broker returns this error code if it receives an offset
    /// fetch or commit request for a group that it is not a
    /// coordinator for.
    NotCoordinatorForGroup,
    /// For a request which attempts to access an invalid topic.
    InvalidTopic,
    /// If a message batch in a produce request exceeds the maximum
    /// configured segment size.
    RecordListTooLarge,
    /// Returned from a produce request when the number of in-sync
    /// replicas is lower than the configured minimum and requiredAcks is -1.
    NotEnoughReplicas,
    /// Returned from a produce request when the message was written
    /// to the log, but with fewer in-sync replicas than required.
    NotEnoughReplicasAfterAppend,
    /// Returned from a produce request if the requested requiredAcks is
    /// invalid (anything other than -1, 1, or 0).
    InvalidRequiredAcks,
    /// A code this client doesn't assign a name to, kept verbatim.
    Other(i16),
}

impl KafkaCode {
    /// `true` for any non-zero code.
    pub fn has_error(&self) -> bool {
        *self != KafkaCode::None
    }

    /// Codes that indicate the client's cached partition leader is stale and
    /// a metadata refresh is warranted before retrying.
    pub fn is_stale_leader(&self) -> bool {
        match *self {
            KafkaCode::LeaderNotAvailable |
            KafkaCode::NotLeaderForPartition |
            KafkaCode::UnknownTopicOrPartition => true,
            _ => false,
        }
    }

    /// Codes that indicate the client's cached group coordinator is stale.
    pub fn is_stale_coordinator(&self) -> bool {
        match *self {
            KafkaCode::GroupCoordinatorNotAvailable |
            KafkaCode::NotCoordinatorForGroup => true,
            _ => false,
        }
    }
}

impl From<i16> for KafkaCode {
    fn from(v: i16) -> Self {
        match v {
            -1 => KafkaCode::Unknown,
            0 => KafkaCode::None,
            1 => KafkaCode::OffsetOutOfRange,
            2 => KafkaCode::CorruptMessage,
            3 => KafkaCode::UnknownTopicOrPartition,
            4 => KafkaCode::InvalidMessageSize,
            5 => KafkaCode::LeaderNotAvailable,
            6 => KafkaCode::NotLeaderForPartition,
            7 => KafkaCode::RequestTimedOut,
            8 => KafkaCode::BrokerNotAvailable,
            9 => KafkaCode::ReplicaNotAvailable,
            10 => KafkaCode::MessageSizeTooLarge,
            11 => KafkaCode::StaleControllerEpoch,
            12 => KafkaCode::OffsetMetadataTooLarge,
            13 => KafkaCode::NetworkException,
            14 => KafkaCode::GroupLoadInProgress,
            15 => KafkaCode::GroupCoordinatorNotAvailable,
            16 => KafkaCode::NotCoordinatorForGroup,
            17 => KafkaCode::InvalidTopic,
            18 => KafkaCode::RecordListTooLarge,
            19 => KafkaCode::NotEnoughReplicas,
            20 => KafkaCode::NotEnoughReplicasAfterAppend,
            21 => KafkaCode::InvalidRequiredAcks,
            other => KafkaCode::Other(other),
        }
    }
}

impl From<KafkaCode> for i16 {
    fn from(code: KafkaCode) -> i16 {
        match code {
            KafkaCode::Unknown => -1,
            KafkaCode::None => 0,
            KafkaCode::OffsetOutOfRange => 1,
            KafkaCode::CorruptMessage => 2,
            KafkaCode::UnknownTopicOrPartition => 3,
            KafkaCode::InvalidMessageSize => 4,
            KafkaCode::LeaderNotAvailable => 5,
            KafkaCode::NotLeaderForPartition => 6,
            KafkaCode::RequestTimedOut => 7,
            KafkaCode::BrokerNotAvailable => 8,
            KafkaCode::ReplicaNotAvailable => 9,
            KafkaCode::MessageSizeTooLarge => 10,
            KafkaCode::StaleControllerEpoch => 11,
            KafkaCode::OffsetMetadataTooLarge => 12,
            KafkaCode::NetworkException => 13,
            KafkaCode::GroupLoadInProgress => 14,
            KafkaCode::GroupCoordinatorNotAvailable => 15,
            KafkaCode::NotCoordinatorForGroup => 16,
            KafkaCode::InvalidTopic => 17,
            KafkaCode::RecordListTooLarge => 18,
            KafkaCode::NotEnoughReplicas => 19,
            KafkaCode::NotEnoughReplicasAfterAppend => 20,
            KafkaCode::InvalidRequiredAcks => 21,
            KafkaCode::Other(v) => v,
        }
    }
}

/// Aggregates the per-broker errors observed while fanning a refresh or
/// coordinator-discovery request out across every known broker.
#[derive(Debug, Default)]
pub struct MultiError(pub Vec<Error>);

impl MultiError {
    pub fn new() -> Self {
        MultiError(Vec::new())
    }

    pub fn push(&mut self, err: Error) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ::std::fmt::Display for MultiError {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        write!(f, "all {} broker attempts failed:", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  - {}", err)?;
        }
        Ok(())
    }
}

error_chain!{
    foreign_links {
        IoError(::std::io::Error);
        ParseError(::nom::ErrorKind);
    }

    errors {
        /// A non-zero error code was reported by the broker.
        KafkaError(code: KafkaCode) {
            description("kafka broker error")
            display("kafka broker error: {:?}", code)
        }
        /// A response arrived for an API key the caller did not ask for.
        UnexpectedResponse(api_key: ApiKey) {
            description("unexpected response")
            display("unexpected response for api key {}", api_key)
        }
        /// Decoding failed due to a malformed length, count, or CRC mismatch.
        CodecError(reason: &'static str) {
            description("codec error")
            display("codec error: {}", reason)
        }
        /// A version string did not match one of the known `KafkaVersion` values.
        UnknownKafkaVersion(version: String) {
            description("unknown kafka version")
            display("unknown kafka version: {}", version)
        }
        /// The connection observed a reply whose correlation id did not match
        /// the head of the pending-request queue.
        CorrelationIdMismatch(expected: i32, actual: i32) {
            description("correlation id mismatch")
            display("correlation id mismatch: expected {} but got {}", expected, actual)
        }
        /// The broker client (or its connection) was closed while a caller
        /// was waiting on a pending reply.
        BrokerClosed {
            description("broker connection closed")
            display("broker connection closed")
        }
        /// A pending job's completion channel was dropped without a result.
        Canceled(reason: &'static str) {
            description("operation canceled")
            display("operation canceled: {}", reason)
        }
        /// No broker matches a node id returned by an earlier metadata load.
        BrokerNotFound(node_id: i32) {
            description("broker not found")
            display("broker #{} not found", node_id)
        }
        /// Every broker in a metadata refresh or coordinator discovery
        /// fan-out failed.
        RefreshFailed(errors: MultiError) {
            description("metadata refresh failed")
            display("{}", errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kafka_code_roundtrip() {
        for v in -1i16..22 {
            let code = KafkaCode::from(v);
            assert_eq!(i16::from(code), v);
        }
        assert_eq!(KafkaCode::from(999), KafkaCode::Other(999));
    }

    #[test]
    fn test_stale_classification() {
        assert!(KafkaCode::NotLeaderForPartition.is_stale_leader());
        assert!(KafkaCode::LeaderNotAvailable.is_stale_leader());
        assert!(KafkaCode::UnknownTopicOrPartition.is_stale_leader());
        assert!(!KafkaCode::OffsetOutOfRange.is_stale_leader());

        assert!(KafkaCode::GroupCoordinatorNotAvailable.is_stale_coordinator());
        assert!(KafkaCode::NotCoordinatorForGroup.is_stale_coordinator());
        assert!(!KafkaCode::NotLeaderForPartition.is_stale_coordinator());
    }

    #[test]
    fn test_has_error() {
        assert!(!KafkaCode::None.has_error());
        assert!(KafkaCode::Unknown.has_error());
    }
}
