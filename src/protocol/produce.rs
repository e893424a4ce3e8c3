use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32, be_i64};

use errors::Result;
use protocol::{ApiVersion, Encodable, MessageSet, MessageSetEncoder, ParseTag, RequestHeader,
               ResponseHeader, WriteExt, parse_response_header, parse_string};

/// ProduceRequest => RequiredAcks Timeout [TopicData]
///   RequiredAcks => int16
///   Timeout => int32
#[derive(Clone, Debug, PartialEq)]
pub struct ProduceRequest {
    pub header: RequestHeader<'static>,
    /// -1 = all in-sync replicas, 0 = no acknowledgement, 1 = leader only.
    pub required_acks: i16,
    /// Maximum time in ms the broker will wait for the required acks.
    pub timeout: i32,
    pub topics: Vec<ProduceTopicData>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProduceTopicData {
    pub topic_name: String,
    pub partitions: Vec<ProducePartitionData>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProducePartitionData {
    pub partition: i32,
    pub message_set: MessageSet,
}

impl Encodable for ProduceRequest {
    fn encode<T: ByteOrder>(self, dst: &mut BytesMut) -> Result<()> {
        let api_version = self.header.api_version;

        self.header.encode::<T>(dst)?;

        dst.put_i16::<T>(self.required_acks);
        dst.put_i32::<T>(self.timeout);

        let encoder = MessageSetEncoder::new(api_version);

        dst.put_array(self.topics, move |buf, topic| {
            buf.put_str::<T, _>(Some(topic.topic_name))?;
            buf.put_array(topic.partitions, |buf, partition| {
                buf.put_i32::<T>(partition.partition);

                let size_off = buf.len();
                buf.put_i32::<T>(0);
                let data_off = buf.len();

                encoder.encode::<T>(partition.message_set, buf)?;

                let size = buf.len() - data_off;
                T::write_i32(&mut buf[size_off..], size as i32);

                Ok(())
            })
        })
    }
}

/// ProduceResponse => [TopicResponse]
#[derive(Clone, Debug, PartialEq)]
pub struct ProduceResponse {
    pub header: ResponseHeader,
    pub topics: Vec<ProduceTopicResponse>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProduceTopicResponse {
    pub topic_name: String,
    pub partitions: Vec<ProducePartitionResponse>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProducePartitionResponse {
    pub partition: i32,
    pub error_code: i16,
    pub offset: i64,
}

named_args!(pub parse_produce_response(api_version: ApiVersion)<ProduceResponse>,
    parse_tag!(ParseTag::ProduceResponse,
        do_parse!(
            header: parse_response_header
         >> topics: parse_tag!(ParseTag::ProduceTopics,
                length_count!(be_i32, apply!(parse_produce_topic_response, api_version)))
         >> (ProduceResponse {
                header: header,
                topics: topics,
            })
        )
    )
);

named_args!(parse_produce_topic_response(api_version: ApiVersion)<ProduceTopicResponse>,
    do_parse!(
        topic_name: parse_string
     >> partitions: parse_tag!(ParseTag::ProducePartitions,
            length_count!(be_i32, parse_produce_partition_response))
     >> (ProduceTopicResponse {
            topic_name: topic_name,
            partitions: partitions,
        })
    )
);

named!(parse_produce_partition_response<ProducePartitionResponse>,
    do_parse!(
        partition: be_i32
     >> error_code: be_i16
     >> offset: be_i64
     >> (ProducePartitionResponse {
            partition: partition,
            error_code: error_code,
            offset: offset,
        })
    )
);

#[cfg(test)]
mod tests {
    use bytes::{BigEndian, BytesMut};

    use nom::IResult;

    use super::*;
    use protocol::{Message, MessageSet, RequestHeader};

    #[test]
    fn test_encode_produce_request() {
        let req = ProduceRequest {
            header: RequestHeader {
                api_key: 0,
                api_version: 0,
                correlation_id: 1,
                client_id: Some("test".into()),
            },
            required_acks: 1,
            timeout: 1000,
            topics: vec![ProduceTopicData {
                topic_name: "my-topic".to_owned(),
                partitions: vec![ProducePartitionData {
                    partition: 0,
                    message_set: MessageSet {
                        messages: vec![Message {
                            offset: 0,
                            timestamp: None,
                            compression: Default::default(),
                            key: None,
                            value: Some(b"hello"[..].into()),
                        }],
                    },
                }],
            }],
        };

        let mut buf = BytesMut::with_capacity(256);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert!(buf.len() > 0);
    }

    #[test]
    fn test_parse_produce_response() {
        let data: Vec<u8> = vec![
            0, 0, 0, 42,                                 // correlation_id
            0, 0, 0, 1,                                   // [topic]
                0, 8, 109, 121, 45, 116, 111, 112, 105, 99, // "my-topic"
                0, 0, 0, 1,                                // [partition]
                    0, 0, 0, 0,                            // partition
                    0, 0,                                  // error_code
                    0, 0, 0, 0, 0, 0, 0, 5,                 // offset
        ];

        match parse_produce_response(&data, 0) {
            IResult::Done(rest, resp) => {
                assert!(rest.is_empty());
                assert_eq!(resp.header.correlation_id, 42);
                assert_eq!(resp.topics[0].topic_name, "my-topic");
                assert_eq!(resp.topics[0].partitions[0].offset, 5);
            }
            other => panic!("unexpected parse result: {:?}", other),
        }
    }
}
