use std::net::Ipv6Addr;
use std::sync::LazyLock as Lazy;

use super::*;
use nsync_core::packet::{
    Contact, Location, MessageBody, NodeInfo, NodeProfile, Response, Status,
};

static GET_NEIGHBOURS_RESPONSE: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    let mut bytes = vec![0x00, 0x00, 0x00, 0x2a, 0x01, 0x00, 0x02, 0x00];
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x20]);
    bytes.extend(std::iter::repeat_n(0x01, 32));
    bytes.push(0x01);
    bytes.extend_from_slice(&Ipv6Addr::LOCALHOST.octets());
    bytes.extend_from_slice(&[0x01, 0xf4]);
    bytes.extend_from_slice(&[0x00, 0x0f, 0x42, 0x40]);
    bytes.extend_from_slice(&[0xff, 0xe1, 0x7b, 0x80]);

    let node = NodeInfo {
        profile: NodeProfile {
            node_id: vec![0x01; 32],
            contact: Contact::Ipv6 {
                host: Ipv6Addr::LOCALHOST,
                port: 500,
            },
        },
        location: Location {
            latitude: 1_000_000,
            longitude: -2_000_000,
        },
    };

    (
        bytes,
        Message {
            id: 42,
            body: MessageBody::Response(
                Response::GetNeighbourNodesByDistanceLocalResponse(
                    Status::Ok,
                    vec![node],
                ),
            ),
        },
    )
});

#[test]
fn test_encode_get_neighbours_response() {
    let (ref bytes, ref msg) = *GET_NEIGHBOURS_RESPONSE;
    test_encode(bytes, msg);
}

#[test]
fn test_decode_get_neighbours_response() {
    let (ref bytes, ref msg) = *GET_NEIGHBOURS_RESPONSE;
    test_decode(bytes, msg);
}

#[test]
fn test_decode_empty_get_neighbours_response() {
    let bytes: Vec<u8> = vec![
        0x00, 0x00, 0x00, 0x2b, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00,
        0x00,
    ];
    let msg = Message {
        id: 43,
        body: MessageBody::Response(
            Response::GetNeighbourNodesByDistanceLocalResponse(
                Status::Ok,
                vec![],
            ),
        ),
    };
    test_decode(&bytes, &msg);
}
