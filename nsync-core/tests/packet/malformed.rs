use super::*;
use nsync_core::packet::DecodeError;

#[test]
fn test_decode_unknown_direction() {
    let bytes: Vec<u8> = vec![0x00, 0x00, 0x00, 0x01, 0x02, 0x00];
    let mut buf = Bytes::copy_from_slice(&bytes);
    let error = Message::decode(&mut buf).unwrap_err();
    assert!(matches!(error, DecodeError::UnknownDirection(2)));
}

#[test]
fn test_decode_trailing_data() {
    let bytes: Vec<u8> =
        vec![0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0xff];
    let mut buf = Bytes::copy_from_slice(&bytes);
    let error = Message::decode(&mut buf).unwrap_err();
    assert!(matches!(error, DecodeError::TrailingData));
}

#[test]
fn test_decode_short_buffer() {
    let bytes: Vec<u8> = vec![0x00, 0x00];
    let mut buf = Bytes::copy_from_slice(&bytes);
    let error = Message::decode(&mut buf).unwrap_err();
    assert!(matches!(error, DecodeError::ReadOutOfBounds));
}
