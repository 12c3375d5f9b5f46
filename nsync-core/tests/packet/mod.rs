//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod malformed;
mod neighbourhood_changed;
mod register_service;
mod responses;

use bytes::{Bytes, BytesMut};
use nsync_core::packet::Message;

fn test_encode(bytes_expected: &[u8], msg: &Message) {
    let mut buf = BytesMut::with_capacity(256);
    msg.encode(&mut buf);
    assert_eq!(bytes_expected, &buf[..]);
}

fn test_decode(bytes: &[u8], msg_expected: &Message) {
    let mut buf = Bytes::copy_from_slice(bytes);
    let msg_actual = Message::decode(&mut buf).unwrap();
    assert_eq!(*msg_expected, msg_actual);
}
