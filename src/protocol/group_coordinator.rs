use bytes::{BufMut, ByteOrder, BytesMut};

use nom::{be_i16, be_i32};

use errors::Result;
use protocol::{Encodable, NodeId, ParseTag, RequestHeader, ResponseHeader, WriteExt,
               parse_response_header, parse_string};

/// GroupCoordinatorRequest => GroupId
///   GroupId => string
#[derive(Clone, Debug, PartialEq)]
pub struct GroupCoordinatorRequest {
    pub header: RequestHeader<'static>,
    pub group_id: String,
}

impl Encodable for GroupCoordinatorRequest {
    fn encode<T: ByteOrder>(self, dst: &mut BytesMut) -> Result<()> {
        self.header.encode::<T>(dst)?;

        dst.put_str::<T, _>(Some(self.group_id))?;
        Ok(())
    }
}

/// GroupCoordinatorResponse => ErrorCode CoordinatorId CoordinatorHost CoordinatorPort
#[derive(Clone, Debug, PartialEq)]
pub struct GroupCoordinatorResponse {
    pub header: ResponseHeader,
    pub error_code: i16,
    pub coordinator_id: NodeId,
    pub coordinator_host: String,
    pub coordinator_port: i32,
}

named!(pub parse_group_coordinator_response<GroupCoordinatorResponse>,
    parse_tag!(ParseTag::GroupCoordinatorResponse,
        do_parse!(
            header: parse_response_header
         >> error_code: be_i16
         >> coordinator_id: be_i32
         >> coordinator_host: parse_string
         >> coordinator_port: be_i32
         >> (GroupCoordinatorResponse {
                header: header,
                error_code: error_code,
                coordinator_id: coordinator_id,
                coordinator_host: coordinator_host,
                coordinator_port: coordinator_port,
            })
        )
    )
);

#[cfg(test)]
mod tests {
    use bytes::{BigEndian, BytesMut};

    use nom::IResult;

    use super::*;
    use protocol::RequestHeader;

    #[test]
    fn test_encode_group_coordinator_request() {
        let req = GroupCoordinatorRequest {
            header: RequestHeader {
                api_key: 10,
                api_version: 0,
                correlation_id: 1,
                client_id: Some("test".into()),
            },
            group_id: "my-group".to_owned(),
        };

        let mut buf = BytesMut::with_capacity(64);

        req.encode::<BigEndian>(&mut buf).unwrap();

        assert_eq!(&buf[buf.len() - 10..], &b"\0\x08my-group"[..]);
    }

    #[test]
    fn test_parse_group_coordinator_response() {
        let data: Vec<u8> = vec![
            0, 0, 0, 1,                                // correlation_id
            0, 0,                                      // error_code
            0, 0, 0, 5,                                  // coordinator_id
            0, 9, 108, 111, 99, 97, 108, 104, 111, 115, 116, // "localhost"
            0, 0, 35, 132,                               // coordinator_port
        ];

        match parse_group_coordinator_response(&data) {
            IResult::Done(rest, resp) => {
                assert!(rest.is_empty());
                assert_eq!(resp.coordinator_id, 5);
                assert_eq!(resp.coordinator_host, "localhost");
                assert_eq!(resp.coordinator_port, 9092);
            }
            other => panic!("unexpected parse result: {:?}", other),
        }
    }
}
