//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The LBN wire protocol: the message envelope, its discriminated-union
//! body, and the request/response correlation builder (§4.2, §6.1).

pub mod codec;

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Deserialize, Serialize};

pub use codec::DecodeError;

/// Correlation ID used on outbound error responses sent without a matching
/// inbound request (§4.1, §6.1).
pub const ERROR_SENTINEL_ID: u32 = 0x0BAD_C0DE;

/// The full message envelope exchanged with the LBN node.
///
/// Encoding format (length prefix is handled by the framed transport, not
/// here):
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        Correlation ID                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Direction  |  Category   |               Body ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Message {
    pub id: u32,
    pub body: MessageBody,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum MessageBody {
    Request(Request),
    Response(Response),
}

/// Requests the core either emits (`RegisterService`, `DeregisterService`,
/// `GetNeighbourNodesByDistanceLocal`) or consumes
/// (`NeighbourhoodChangedNotification`) — see §6.1.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Request {
    RegisterService(NodeProfile),
    DeregisterService,
    GetNeighbourNodesByDistanceLocal,
    NeighbourhoodChangedNotification(Vec<NeighborhoodChange>),
}

/// Responses the core either emits (`NeighbourhoodChangedNotificationResponse`,
/// `ErrorProtocolViolation`, `ErrorInternal`) or consumes (the three
/// `*Response` kinds matching the requests it sends) — see §6.1.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Response {
    RegisterServiceResponse(Status),
    DeregisterServiceResponse(Status),
    GetNeighbourNodesByDistanceLocalResponse(Status, Vec<NodeInfo>),
    NeighbourhoodChangedNotificationResponse,
    ErrorProtocolViolation,
    ErrorInternal,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Status {
    Ok,
    ErrInternal,
    ErrProtocolViolation,
    ErrUnknown,
}

/// A peer's advertised identity and reachability, as sent in
/// `RegisterService` and carried inside `NodeInfo`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NodeProfile {
    pub node_id: Vec<u8>,
    pub contact: Contact,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Contact {
    Ipv4 { host: Ipv4Addr, port: u16 },
    Ipv6 { host: Ipv6Addr, port: u16 },
}

impl Contact {
    pub fn port(&self) -> u16 {
        match self {
            Contact::Ipv4 { port, .. } => *port,
            Contact::Ipv6 { port, .. } => *port,
        }
    }

    pub fn addr(&self) -> std::net::IpAddr {
        match self {
            Contact::Ipv4 { host, .. } => std::net::IpAddr::V4(*host),
            Contact::Ipv6 { host, .. } => std::net::IpAddr::V6(*host),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NodeInfo {
    pub profile: NodeProfile,
    pub location: Location,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Location {
    pub latitude: i32,
    pub longitude: i32,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum NeighborhoodChange {
    AddedNodeInfo(NodeInfo),
    UpdatedNodeInfo(NodeInfo),
    RemovedNodeId(Vec<u8>),
}

/// Allocates correlation IDs for a single session.
///
/// A fresh builder is created per session, resetting the counter; this is
/// fine because correlation is scoped to the session (§9).
#[derive(Debug, Default)]
pub struct MessageBuilder {
    next_id: u32,
}

impl MessageBuilder {
    pub fn new() -> Self {
        MessageBuilder { next_id: 0 }
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn request(&mut self, request: Request) -> Message {
        Message {
            id: self.alloc_id(),
            body: MessageBody::Request(request),
        }
    }

    /// Builds a response correlated to an inbound request's ID.
    pub fn response_to(id: u32, response: Response) -> Message {
        Message {
            id,
            body: MessageBody::Response(response),
        }
    }

    /// Builds an error response with no correlating inbound request,
    /// using the sentinel ID (§4.1, §6.1).
    pub fn error_without_correlation(response: Response) -> Message {
        Message {
            id: ERROR_SENTINEL_ID,
            body: MessageBody::Response(response),
        }
    }
}

impl Message {
    /// Returns `true` if `self` is a [`Response`](MessageBody::Response)
    /// that correlates to `request` under the rule in §4.2: same ID, and
    /// tagged `Response`.
    pub fn correlates_to(&self, request_id: u32) -> bool {
        self.id == request_id && matches!(self.body, MessageBody::Response(_))
    }
}
