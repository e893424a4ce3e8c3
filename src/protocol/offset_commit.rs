use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32, be_i64};

use errors::Result;
use protocol::{Encodable, ParseTag, RequestHeader, ResponseHeader, Timestamp, WriteExt,
               parse_response_header, parse_string};

/// OffsetCommitRequest (v1) => ConsumerGroup ConsumerGroupGenerationId ConsumerId [TopicData]
///   ConsumerGroup => string
///   ConsumerGroupGenerationId => int32
///   ConsumerId => string
///
/// v1 is the version addressed at standalone (non group-managed) offset
/// storage on the broker: the client supplies its own timestamp per
/// partition rather than letting the broker stamp the commit.
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitRequest {
    pub header: RequestHeader<'static>,
    pub consumer_group: String,
    pub consumer_group_generation_id: i32,
    pub consumer_id: String,
    pub topics: Vec<OffsetCommitTopic>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitTopic {
    pub topic_name: String,
    pub partitions: Vec<OffsetCommitPartition>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitPartition {
    pub partition: i32,
    pub offset: i64,
    /// Commit timestamp in ms, typically `now + offset.retention.ms`.
    pub timestamp: Timestamp,
    pub metadata: Option<String>,
}

impl Encodable for OffsetCommitRequest {
    fn encode<T: ByteOrder>(self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_str::<T, _>(Some(self.consumer_group))?;
        dst.put_i32::<T>(self.consumer_group_generation_id);
        dst.put_str::<T, _>(Some(self.consumer_id))?;
        dst.put_array(self.topics, |buf, topic| {
            buf.put_str::<T, _>(Some(topic.topic_name))?;
            buf.put_array(topic.partitions, |buf, partition| {
                buf.put_i32::<T>(partition.partition);
                buf.put_i64::<T>(partition.offset);
                buf.put_i64::<T>(partition.timestamp);
                buf.put_str::<T, _>(partition.metadata)?;
                Ok(())
            })
        })
    }
}

/// OffsetCommitResponse => [TopicResponse]
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitResponse {
    pub header: ResponseHeader,
    pub topics: Vec<OffsetCommitTopicResponse>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitTopicResponse {
    pub topic_name: String,
    pub partitions: Vec<OffsetCommitPartitionResponse>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetCommitPartitionResponse {
    pub partition: i32,
    pub error_code: i16,
}

named!(pub parse_offset_commit_response<OffsetCommitResponse>,
    parse_tag!(ParseTag::OffsetCommitResponse,
        do_parse!(
            header: parse_response_header
         >> topics: length_count!(be_i32, parse_offset_commit_topic_response)
         >> (OffsetCommitResponse {
                header: header,
                topics: topics,
            })
        )
    )
);

named!(parse_offset_commit_topic_response<OffsetCommitTopicResponse>,
    do_parse!(
        topic_name: parse_string
     >> partitions: length_count!(be_i32, parse_offset_commit_partition_response)
     >> (OffsetCommitTopicResponse {
            topic_name: topic_name,
            partitions: partitions,
        })
    )
);

named!(parse_offset_commit_partition_response<OffsetCommitPartitionResponse>,
    do_parse!(
        partition: be_i32
     >> error_code: be_i16
     >> (OffsetCommitPartitionResponse {
            partition: partition,
            error_code: error_code,
        })
    )
);
