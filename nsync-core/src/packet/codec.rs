//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use bytes::{Buf, BufMut, Bytes, BytesMut, TryGetError};
use nsync_utils::bytes::{BytesExt, BytesMutExt};

use crate::packet::{
    Contact, Location, Message, MessageBody, NeighborhoodChange, NodeInfo,
    NodeProfile, Request, Response, Status,
};

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while decoding a message body (§4.1 "Errors"). Any of
/// these is reported upward as a protocol violation.
#[derive(Debug)]
pub enum DecodeError {
    ReadOutOfBounds,
    UnknownDirection(u8),
    UnknownCategory(u8),
    UnknownRequestKind(u8),
    UnknownResponseKind(u8),
    UnknownContactDiscriminator(u8),
    UnknownStatus(u8),
    UnknownChangeDiscriminator(u8),
    TrailingData,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::ReadOutOfBounds => {
                write!(f, "attempt to read out of bounds")
            }
            DecodeError::UnknownDirection(v) => {
                write!(f, "unknown message direction: {v}")
            }
            DecodeError::UnknownCategory(v) => {
                write!(f, "unknown message category: {v}")
            }
            DecodeError::UnknownRequestKind(v) => {
                write!(f, "unknown request kind: {v}")
            }
            DecodeError::UnknownResponseKind(v) => {
                write!(f, "unknown response kind: {v}")
            }
            DecodeError::UnknownContactDiscriminator(v) => {
                write!(f, "unknown contact discriminator: {v}")
            }
            DecodeError::UnknownStatus(v) => {
                write!(f, "unknown status code: {v}")
            }
            DecodeError::UnknownChangeDiscriminator(v) => {
                write!(f, "unknown neighborhood change discriminator: {v}")
            }
            DecodeError::TrailingData => {
                write!(f, "trailing data after message body")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<TryGetError> for DecodeError {
    fn from(_error: TryGetError) -> DecodeError {
        DecodeError::ReadOutOfBounds
    }
}

// Wire constants.
const DIR_REQUEST: u8 = 0;
const DIR_RESPONSE: u8 = 1;

const CATEGORY_LOCAL_SERVICE: u8 = 0;

const REQ_REGISTER_SERVICE: u8 = 0;
const REQ_DEREGISTER_SERVICE: u8 = 1;
const REQ_GET_NEIGHBOUR_NODES_BY_DISTANCE_LOCAL: u8 = 2;
const REQ_NEIGHBOURHOOD_CHANGED_NOTIFICATION: u8 = 3;

const RESP_REGISTER_SERVICE: u8 = 0;
const RESP_DEREGISTER_SERVICE: u8 = 1;
const RESP_GET_NEIGHBOUR_NODES_BY_DISTANCE_LOCAL: u8 = 2;
const RESP_NEIGHBOURHOOD_CHANGED_NOTIFICATION: u8 = 3;
const RESP_ERROR_PROTOCOL_VIOLATION: u8 = 4;
const RESP_ERROR_INTERNAL: u8 = 5;

const CONTACT_IPV4: u8 = 0;
const CONTACT_IPV6: u8 = 1;

const CHANGE_ADDED: u8 = 0;
const CHANGE_UPDATED: u8 = 1;
const CHANGE_REMOVED: u8 = 2;

// ===== impl Message =====

impl Message {
    /// Encodes this message into `buf`. The framed transport is
    /// responsible for the outer length prefix.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.id);
        match &self.body {
            MessageBody::Request(request) => {
                buf.put_u8(DIR_REQUEST);
                buf.put_u8(CATEGORY_LOCAL_SERVICE);
                request.encode(buf);
            }
            MessageBody::Response(response) => {
                buf.put_u8(DIR_RESPONSE);
                buf.put_u8(CATEGORY_LOCAL_SERVICE);
                response.encode(buf);
            }
        }
    }

    /// Decodes a message body previously extracted by the framed
    /// transport (the length prefix has already been consumed).
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Message> {
        let id = buf.try_get_u32()?;
        let direction = buf.try_get_u8()?;
        let category = buf.try_get_u8()?;
        if category != CATEGORY_LOCAL_SERVICE {
            return Err(DecodeError::UnknownCategory(category));
        }

        let body = match direction {
            DIR_REQUEST => MessageBody::Request(Request::decode(buf)?),
            DIR_RESPONSE => MessageBody::Response(Response::decode(buf)?),
            other => return Err(DecodeError::UnknownDirection(other)),
        };

        if buf.has_remaining() {
            return Err(DecodeError::TrailingData);
        }

        Ok(Message { id, body })
    }
}

// ===== impl Request =====

impl Request {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            Request::RegisterService(profile) => {
                buf.put_u8(REQ_REGISTER_SERVICE);
                profile.encode(buf);
            }
            Request::DeregisterService => {
                buf.put_u8(REQ_DEREGISTER_SERVICE);
            }
            Request::GetNeighbourNodesByDistanceLocal => {
                buf.put_u8(REQ_GET_NEIGHBOUR_NODES_BY_DISTANCE_LOCAL);
            }
            Request::NeighbourhoodChangedNotification(changes) => {
                buf.put_u8(REQ_NEIGHBOURHOOD_CHANGED_NOTIFICATION);
                buf.put_u32(changes.len() as u32);
                for change in changes {
                    change.encode(buf);
                }
            }
        }
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<Request> {
        let kind = buf.try_get_u8()?;
        let request = match kind {
            REQ_REGISTER_SERVICE => {
                Request::RegisterService(NodeProfile::decode(buf)?)
            }
            REQ_DEREGISTER_SERVICE => Request::DeregisterService,
            REQ_GET_NEIGHBOUR_NODES_BY_DISTANCE_LOCAL => {
                Request::GetNeighbourNodesByDistanceLocal
            }
            REQ_NEIGHBOURHOOD_CHANGED_NOTIFICATION => {
                let count = buf.try_get_u32()?;
                let mut changes = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    changes.push(NeighborhoodChange::decode(buf)?);
                }
                Request::NeighbourhoodChangedNotification(changes)
            }
            other => return Err(DecodeError::UnknownRequestKind(other)),
        };
        Ok(request)
    }
}

// ===== impl Response =====

impl Response {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            Response::RegisterServiceResponse(status) => {
                buf.put_u8(RESP_REGISTER_SERVICE);
                status.encode(buf);
            }
            Response::DeregisterServiceResponse(status) => {
                buf.put_u8(RESP_DEREGISTER_SERVICE);
                status.encode(buf);
            }
            Response::GetNeighbourNodesByDistanceLocalResponse(
                status,
                nodes,
            ) => {
                buf.put_u8(RESP_GET_NEIGHBOUR_NODES_BY_DISTANCE_LOCAL);
                status.encode(buf);
                buf.put_u32(nodes.len() as u32);
                for node in nodes {
                    node.encode(buf);
                }
            }
            Response::NeighbourhoodChangedNotificationResponse => {
                buf.put_u8(RESP_NEIGHBOURHOOD_CHANGED_NOTIFICATION);
            }
            Response::ErrorProtocolViolation => {
                buf.put_u8(RESP_ERROR_PROTOCOL_VIOLATION);
            }
            Response::ErrorInternal => {
                buf.put_u8(RESP_ERROR_INTERNAL);
            }
        }
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<Response> {
        let kind = buf.try_get_u8()?;
        let response = match kind {
            RESP_REGISTER_SERVICE => {
                Response::RegisterServiceResponse(Status::decode(buf)?)
            }
            RESP_DEREGISTER_SERVICE => {
                Response::DeregisterServiceResponse(Status::decode(buf)?)
            }
            RESP_GET_NEIGHBOUR_NODES_BY_DISTANCE_LOCAL => {
                let status = Status::decode(buf)?;
                let count = buf.try_get_u32()?;
                let mut nodes = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    nodes.push(NodeInfo::decode(buf)?);
                }
                Response::GetNeighbourNodesByDistanceLocalResponse(
                    status, nodes,
                )
            }
            RESP_NEIGHBOURHOOD_CHANGED_NOTIFICATION => {
                Response::NeighbourhoodChangedNotificationResponse
            }
            RESP_ERROR_PROTOCOL_VIOLATION => Response::ErrorProtocolViolation,
            RESP_ERROR_INTERNAL => Response::ErrorInternal,
            other => return Err(DecodeError::UnknownResponseKind(other)),
        };
        Ok(response)
    }
}

// ===== impl Status =====

impl Status {
    fn encode(&self, buf: &mut BytesMut) {
        let value: u8 = match self {
            Status::Ok => 0,
            Status::ErrInternal => 1,
            Status::ErrProtocolViolation => 2,
            Status::ErrUnknown => 3,
        };
        buf.put_u8(value);
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<Status> {
        let value = buf.try_get_u8()?;
        let status = match value {
            0 => Status::Ok,
            1 => Status::ErrInternal,
            2 => Status::ErrProtocolViolation,
            3 => Status::ErrUnknown,
            other => return Err(DecodeError::UnknownStatus(other)),
        };
        Ok(status)
    }
}

// ===== impl NodeProfile =====

impl NodeProfile {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_bytes_lp(&self.node_id);
        self.contact.encode(buf);
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<NodeProfile> {
        let node_id = buf.try_get_bytes()?.to_vec();
        let contact = Contact::decode(buf)?;
        Ok(NodeProfile { node_id, contact })
    }
}

// ===== impl Contact =====

impl Contact {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            Contact::Ipv4 { host, port } => {
                buf.put_u8(CONTACT_IPV4);
                buf.put_ipv4(host);
                buf.put_u16(*port);
            }
            Contact::Ipv6 { host, port } => {
                buf.put_u8(CONTACT_IPV6);
                buf.put_ipv6(host);
                buf.put_u16(*port);
            }
        }
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<Contact> {
        let discriminator = buf.try_get_u8()?;
        let contact = match discriminator {
            CONTACT_IPV4 => {
                let host = buf.try_get_ipv4()?;
                let port = buf.try_get_u16()?;
                Contact::Ipv4 { host, port }
            }
            CONTACT_IPV6 => {
                let host = buf.try_get_ipv6()?;
                let port = buf.try_get_u16()?;
                Contact::Ipv6 { host, port }
            }
            other => {
                return Err(DecodeError::UnknownContactDiscriminator(other));
            }
        };
        Ok(contact)
    }
}

// ===== impl NodeInfo =====

impl NodeInfo {
    fn encode(&self, buf: &mut BytesMut) {
        self.profile.encode(buf);
        self.location.encode(buf);
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<NodeInfo> {
        let profile = NodeProfile::decode(buf)?;
        let location = Location::decode(buf)?;
        Ok(NodeInfo { profile, location })
    }
}

// ===== impl Location =====

impl Location {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32(self.latitude);
        buf.put_i32(self.longitude);
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<Location> {
        let latitude = buf.try_get_i32()?;
        let longitude = buf.try_get_i32()?;
        Ok(Location {
            latitude,
            longitude,
        })
    }
}

// ===== impl NeighborhoodChange =====

impl NeighborhoodChange {
    fn encode(&self, buf: &mut BytesMut) {
        match self {
            NeighborhoodChange::AddedNodeInfo(node) => {
                buf.put_u8(CHANGE_ADDED);
                node.encode(buf);
            }
            NeighborhoodChange::UpdatedNodeInfo(node) => {
                buf.put_u8(CHANGE_UPDATED);
                node.encode(buf);
            }
            NeighborhoodChange::RemovedNodeId(id) => {
                buf.put_u8(CHANGE_REMOVED);
                buf.put_bytes_lp(id);
            }
        }
    }

    fn decode(buf: &mut Bytes) -> DecodeResult<NeighborhoodChange> {
        let discriminator = buf.try_get_u8()?;
        let change = match discriminator {
            CHANGE_ADDED => {
                NeighborhoodChange::AddedNodeInfo(NodeInfo::decode(buf)?)
            }
            CHANGE_UPDATED => {
                NeighborhoodChange::UpdatedNodeInfo(NodeInfo::decode(buf)?)
            }
            CHANGE_REMOVED => {
                let id = buf.try_get_bytes()?.to_vec();
                NeighborhoodChange::RemovedNodeId(id)
            }
            other => {
                return Err(DecodeError::UnknownChangeDiscriminator(other));
            }
        };
        Ok(change)
    }
}
