use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32};

use errors::Result;
use protocol::{Encodable, NodeId, ParseTag, RequestHeader, ResponseHeader, WriteExt,
               parse_response_header, parse_string};

/// MetadataRequest => [topic_name]
///   topic_name => string
///
/// An empty topic list requests metadata for all topics the broker knows
/// about.
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataRequest<'a> {
    pub header: RequestHeader<'a>,
    pub topic_names: Vec<String>,
}

impl<'a> Encodable for MetadataRequest<'a> {
    fn encode<T: ByteOrder>(self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_array(self.topic_names, |buf, name| buf.put_str::<T, _>(Some(name)))
    }
}

/// MetadataResponse => [broker] [topic_metadata]
#[derive(Clone, Debug, PartialEq)]
pub struct MetadataResponse {
    pub header: ResponseHeader,
    pub brokers: Vec<BrokerMetadata>,
    pub topics: Vec<TopicMetadata>,
}

/// Broker => node_id host port
#[derive(Clone, Debug, PartialEq)]
pub struct BrokerMetadata {
    pub node_id: NodeId,
    pub host: String,
    pub port: i32,
}

/// TopicMetadata => topic_error_code topic_name [partition_metadata]
#[derive(Clone, Debug, PartialEq)]
pub struct TopicMetadata {
    pub error_code: i16,
    pub topic_name: String,
    pub partitions: Vec<PartitionMetadata>,
}

/// PartitionMetadata => partition_error_code partition_id leader [replicas] [isr]
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionMetadata {
    pub error_code: i16,
    pub partition_id: i32,
    pub leader: NodeId,
    pub replicas: Vec<NodeId>,
    pub isr: Vec<NodeId>,
}

named!(pub parse_metadata_response<MetadataResponse>,
    parse_tag!(ParseTag::MetadataResponse,
        do_parse!(
            header: parse_response_header
         >> brokers: parse_tag!(ParseTag::MetadataBrokers,
                length_count!(be_i32, parse_broker_metadata))
         >> topics: parse_tag!(ParseTag::MetadataTopics,
                length_count!(be_i32, parse_topic_metadata))
         >> (MetadataResponse {
                header: header,
                brokers: brokers,
                topics: topics,
            })
        )
    )
);

named!(parse_broker_metadata<BrokerMetadata>,
    do_parse!(
        node_id: be_i32
     >> host: parse_string
     >> port: be_i32
     >> (BrokerMetadata {
            node_id: node_id,
            host: host,
            port: port,
        })
    )
);

named!(parse_topic_metadata<TopicMetadata>,
    do_parse!(
        error_code: be_i16
     >> topic_name: parse_string
     >> partitions: parse_tag!(ParseTag::MetadataPartitions,
            length_count!(be_i32, parse_partition_metadata))
     >> (TopicMetadata {
            error_code: error_code,
            topic_name: topic_name,
            partitions: partitions,
        })
    )
);

named!(parse_partition_metadata<PartitionMetadata>,
    do_parse!(
        error_code: be_i16
     >> partition_id: be_i32
     >> leader: be_i32
     >> replicas: length_count!(be_i32, be_i32)
     >> isr: length_count!(be_i32, be_i32)
     >> (PartitionMetadata {
            error_code: error_code,
            partition_id: partition_id,
            leader: leader,
            replicas: replicas,
            isr: isr,
        })
    )
);

#[cfg(test)]
mod tests {
    use bytes::{BigEndian, BytesMut};

    use nom::IResult;

    use super::*;
    use protocol::RequestHeader;

    lazy_static!{
        static ref TEST_RESPONSE_DATA: Vec<u8> = vec![
            0, 0, 0, 123,                      // correlation_id
            0, 0, 0, 1,                        // [broker]
                0, 0, 0, 1,                    // node_id
                0, 9, 108, 111, 99, 97, 108, 104, 111, 115, 116, // host "localhost"
                0, 0, 35, 132,                 // port 9092
            0, 0, 0, 1,                        // [topic_metadata]
                0, 0,                          // topic_error_code
                0, 4, 116, 101, 115, 116,       // topic_name "test"
                0, 0, 0, 1,                    // [partition_metadata]
                    0, 0,                      // partition_error_code
                    0, 0, 0, 0,                // partition_id
                    0, 0, 0, 1,                // leader
                    0, 0, 0, 1, 0, 0, 0, 1,    // replicas [1]
                    0, 0, 0, 1, 0, 0, 0, 1,    // isr [1]
        ];
    }

    #[test]
    fn test_encode_metadata_request() {
        let req = MetadataRequest {
            header: RequestHeader {
                api_key: 3,
                api_version: 0,
                correlation_id: 1,
                client_id: Some("test".into()),
            },
            topic_names: vec!["my-topic".to_owned()],
        };

        let mut buf = BytesMut::with_capacity(64);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[buf.len() - 14..], &b"\0\0\0\x01\0\x08my-topic"[..]);
    }

    #[test]
    fn test_parse_metadata_response() {
        let (rest, resp) = match parse_metadata_response(TEST_RESPONSE_DATA.as_slice()) {
            IResult::Done(rest, resp) => (rest, resp),
            other => panic!("unexpected parse result: {:?}", other),
        };

        assert!(rest.is_empty());
        assert_eq!(resp.header.correlation_id, 123);
        assert_eq!(resp.brokers.len(), 1);
        assert_eq!(resp.brokers[0].host, "localhost");
        assert_eq!(resp.brokers[0].port, 9092);
        assert_eq!(resp.topics.len(), 1);
        assert_eq!(resp.topics[0].topic_name, "test");
        assert_eq!(resp.topics[0].partitions.len(), 1);
        assert_eq!(resp.topics[0].partitions[0].leader, 1);
        assert_eq!(resp.topics[0].partitions[0].replicas, vec![1]);
    }
}
