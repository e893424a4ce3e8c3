use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32, be_i64};

use errors::Result;
use protocol::{Encodable, NodeId, ParseTag, RequestHeader, ResponseHeader, Timestamp, WriteExt,
               parse_response_header, parse_string};

/// OffsetRequest => ReplicaId [TopicData]
///   ReplicaId => int32
///
/// Lists valid offsets for a set of partitions as of a given time, or
/// the earliest/latest available offset (`time` = -2 / -1).
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetRequest {
    pub header: RequestHeader<'static>,
    pub replica_id: NodeId,
    pub topics: Vec<OffsetTopic>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetTopic {
    pub topic_name: String,
    pub partitions: Vec<OffsetPartition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetPartition {
    pub partition: i32,
    /// -1 = latest, -2 = earliest, otherwise a ms timestamp.
    pub time: Timestamp,
    pub max_num_offsets: i32,
}

impl Encodable for OffsetRequest {
    fn encode<T: ByteOrder>(self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_i32::<T>(self.replica_id);
        dst.put_array(self.topics, |buf, topic| {
            buf.put_str::<T, _>(Some(topic.topic_name))?;
            buf.put_array(topic.partitions, |buf, partition| {
                buf.put_i32::<T>(partition.partition);
                buf.put_i64::<T>(partition.time);
                buf.put_i32::<T>(partition.max_num_offsets);
                Ok(())
            })
        })
    }
}

/// OffsetResponse => [TopicResponse]
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetResponse {
    pub header: ResponseHeader,
    pub topics: Vec<OffsetTopicResponse>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetTopicResponse {
    pub topic_name: String,
    pub partitions: Vec<OffsetPartitionResponse>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetPartitionResponse {
    pub partition: i32,
    pub error_code: i16,
    pub offsets: Vec<i64>,
}

named!(pub parse_offset_response<OffsetResponse>,
    parse_tag!(ParseTag::OffsetResponse,
        do_parse!(
            header: parse_response_header
         >> topics: parse_tag!(ParseTag::OffsetTopics,
                length_count!(be_i32, parse_offset_topic_response))
         >> (OffsetResponse {
                header: header,
                topics: topics,
            })
        )
    )
);

named!(parse_offset_topic_response<OffsetTopicResponse>,
    do_parse!(
        topic_name: parse_string
     >> partitions: parse_tag!(ParseTag::OffsetPartitions,
            length_count!(be_i32, parse_offset_partition_response))
     >> (OffsetTopicResponse {
            topic_name: topic_name,
            partitions: partitions,
        })
    )
);

named!(parse_offset_partition_response<OffsetPartitionResponse>,
    do_parse!(
        partition: be_i32
     >> error_code: be_i16
     >> offsets: length_count!(be_i32, be_i64)
     >> (OffsetPartitionResponse {
            partition: partition,
            error_code: error_code,
            offsets: offsets,
        })
    )
);

#[cfg(test)]
mod tests {
    use nom::IResult;

    use super::*;

    #[test]
    fn test_parse_offset_response() {
        let data: Vec<u8> = vec![
            0, 0, 0, 1,                                 // correlation_id
            0, 0, 0, 1,                                  // [topic]
                0, 4, 116, 101, 115, 116,                // "test"
                0, 0, 0, 1,                               // [partition]
                    0, 0, 0, 0,                           // partition
                    0, 0,                                 // error_code
                    0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 99,   // offsets: [99]
        ];

        match parse_offset_response(&data) {
            IResult::Done(rest, resp) => {
                assert!(rest.is_empty());
                assert_eq!(resp.topics[0].partitions[0].offsets, vec![99]);
            }
            other => panic!("unexpected parse result: {:?}", other),
        }
    }
}
