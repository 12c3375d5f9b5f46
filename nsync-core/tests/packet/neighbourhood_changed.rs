use std::net::Ipv4Addr;

use super::*;
use nsync_core::packet::{
    Contact, DecodeError, Location, MessageBody, NeighborhoodChange, NodeInfo,
    NodeProfile, Request,
};

fn sample_node(byte: u8, port: u16) -> NodeInfo {
    NodeInfo {
        profile: NodeProfile {
            node_id: vec![byte; 32],
            contact: Contact::Ipv4 {
                host: Ipv4Addr::new(192, 168, 0, byte),
                port,
            },
        },
        location: Location {
            latitude: 0,
            longitude: 0,
        },
    }
}

#[test]
fn test_round_trip_neighbourhood_changed() {
    let msg = Message {
        id: 5,
        body: MessageBody::Request(Request::NeighbourhoodChangedNotification(
            vec![
                NeighborhoodChange::AddedNodeInfo(sample_node(0x01, 100)),
                NeighborhoodChange::UpdatedNodeInfo(sample_node(0x02, 200)),
                NeighborhoodChange::RemovedNodeId(vec![0x03; 32]),
            ],
        )),
    };

    let mut buf = BytesMut::new();
    msg.encode(&mut buf);
    let mut decode_buf = buf.freeze();
    assert_eq!(msg, Message::decode(&mut decode_buf).unwrap());
}

#[test]
fn test_decode_unknown_change_discriminator() {
    let bytes: Vec<u8> = vec![
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01,
        0xff,
    ];
    let mut buf = Bytes::copy_from_slice(&bytes);
    let error = Message::decode(&mut buf).unwrap_err();
    assert!(matches!(
        error,
        DecodeError::UnknownChangeDiscriminator(0xff)
    ));
}

/// A bad contact discriminator nested inside a change item fails the whole
/// message decode before the reconciler ever sees it (§4.1): the session
/// engine reports this as a protocol violation, not as a reconciler-level
/// persistence failure (see DESIGN.md "contact discriminator vs §8 S6").
#[test]
fn test_decode_invalid_contact_discriminator_in_added_node() {
    let mut bytes: Vec<u8> = vec![0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x03];
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]); // one change
    bytes.push(0x00); // CHANGE_ADDED
    bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x20]); // node_id length
    bytes.extend(std::iter::repeat_n(0x07, 32));
    bytes.push(0xee); // invalid contact discriminator

    let mut buf = Bytes::copy_from_slice(&bytes);
    let error = Message::decode(&mut buf).unwrap_err();
    assert!(matches!(
        error,
        DecodeError::UnknownContactDiscriminator(0xee)
    ));
}
