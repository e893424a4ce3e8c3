use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32, be_i64};

use errors::Result;
use protocol::{Encodable, ParseTag, RequestHeader, ResponseHeader, WriteExt,
               parse_response_header, parse_string};

/// OffsetFetchRequest (v1) => ConsumerGroup [TopicData]
///   ConsumerGroup => string
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetFetchRequest {
    pub header: RequestHeader<'static>,
    pub consumer_group: String,
    pub topics: Vec<OffsetFetchTopic>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetFetchTopic {
    pub topic_name: String,
    pub partitions: Vec<i32>,
}

impl Encodable for OffsetFetchRequest {
    fn encode<T: ByteOrder>(self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_str::<T, _>(Some(self.consumer_group))?;
        dst.put_array(self.topics, |buf, topic| {
            buf.put_str::<T, _>(Some(topic.topic_name))?;
            buf.put_array(topic.partitions, |buf, partition| {
                buf.put_i32::<T>(partition);
                Ok(())
            })
        })
    }
}

/// OffsetFetchResponse => [TopicResponse]
#[derive(Clone, Debug, PartialEq)]
pub struct OffsetFetchResponse {
    pub header: ResponseHeader,
    pub topics: Vec<OffsetFetchTopicResponse>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetFetchTopicResponse {
    pub topic_name: String,
    pub partitions: Vec<OffsetFetchPartitionResponse>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetFetchPartitionResponse {
    pub partition: i32,
    pub offset: i64,
    pub metadata: Option<String>,
    pub error_code: i16,
}

named!(pub parse_offset_fetch_response<OffsetFetchResponse>,
    parse_tag!(ParseTag::OffsetFetchResponse,
        do_parse!(
            header: parse_response_header
         >> topics: length_count!(be_i32, parse_offset_fetch_topic_response)
         >> (OffsetFetchResponse {
                header: header,
                topics: topics,
            })
        )
    )
);

named!(parse_offset_fetch_topic_response<OffsetFetchTopicResponse>,
    do_parse!(
        topic_name: parse_string
     >> partitions: length_count!(be_i32, parse_offset_fetch_partition_response)
     >> (OffsetFetchTopicResponse {
            topic_name: topic_name,
            partitions: partitions,
        })
    )
);

named!(parse_offset_fetch_partition_response<OffsetFetchPartitionResponse>,
    do_parse!(
        partition: be_i32
     >> offset: be_i64
     >> metadata: call!(::protocol::parse_str)
     >> error_code: be_i16
     >> (OffsetFetchPartitionResponse {
            partition: partition,
            offset: offset,
            metadata: metadata.map(|s| s.into_owned()),
            error_code: error_code,
        })
    )
);
