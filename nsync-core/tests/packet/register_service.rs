use std::net::Ipv4Addr;
use std::sync::LazyLock as Lazy;

use super::*;
use nsync_core::packet::{Contact, MessageBody, NodeProfile, Request};

static REGISTER_SERVICE: Lazy<(Vec<u8>, Message)> = Lazy::new(|| {
    let node_id = vec![0xAA; 32];

    let mut bytes = vec![0x00, 0x00, 0x00, 0x07, 0x00, 0x00, 0x00];
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x20]);
    bytes.extend(std::iter::repeat_n(0xAA, 32));
    bytes.extend_from_slice(&[0x00, 0x0a, 0x00, 0x00, 0x01, 0x23, 0x28]);

    (
        bytes,
        Message {
            id: 7,
            body: MessageBody::Request(Request::RegisterService(NodeProfile {
                node_id,
                contact: Contact::Ipv4 {
                    host: Ipv4Addr::new(10, 0, 0, 1),
                    port: 9000,
                },
            })),
        },
    )
});

#[test]
fn test_encode_register_service() {
    let (ref bytes, ref msg) = *REGISTER_SERVICE;
    test_encode(bytes, msg);
}

#[test]
fn test_decode_register_service() {
    let (ref bytes, ref msg) = *REGISTER_SERVICE;
    test_decode(bytes, msg);
}

#[test]
fn test_round_trip_deregister_service() {
    let msg = Message {
        id: 11,
        body: MessageBody::Request(Request::DeregisterService),
    };
    let mut buf = BytesMut::new();
    msg.encode(&mut buf);
    let mut decode_buf = buf.freeze();
    assert_eq!(msg, Message::decode(&mut decode_buf).unwrap());
}
