//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel value for "no location" on the wire, mirrored here so the
/// reconciler can recognize it without depending on the codec module.
pub const LOCATION_UNSET: i32 = i32::MIN;

pub const LATITUDE_MIN: i32 = -90_000_000;
pub const LATITUDE_MAX: i32 = 90_000_000;
pub const LONGITUDE_MIN: i32 = -180_000_000;
pub const LONGITUDE_MAX: i32 = 180_000_000;

/// A known peer profile server.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Neighbor {
    /// Opaque identifier, exactly [`Config::identifier_length`](crate::config::Config)
    /// bytes (SHA-256 of the peer's public key). Primary key.
    pub neighbor_id: Vec<u8>,
    pub ip_address: IpAddr,
    pub primary_port: u16,
    /// Populated later by the external profile-sharing handshake;
    /// invalidated by the reconciler whenever `primary_port` changes.
    pub sr_neighbor_port: Option<u16>,
    pub location_latitude: i32,
    pub location_longitude: i32,
    /// Unset means "not yet initialized by the peer-to-peer handshake";
    /// while unset, inbound updates from this neighbor are rejected by
    /// downstream components (enforced outside this core).
    pub last_refresh_time: Option<DateTime<Utc>>,
}

impl Neighbor {
    pub fn new(
        neighbor_id: Vec<u8>,
        ip_address: IpAddr,
        primary_port: u16,
        location_latitude: i32,
        location_longitude: i32,
    ) -> Self {
        Neighbor {
            neighbor_id,
            ip_address,
            primary_port,
            sr_neighbor_port: None,
            location_latitude,
            location_longitude,
            last_refresh_time: None,
        }
    }
}

/// A durable work item for the Action Processor.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NeighborhoodAction {
    pub server_id: Vec<u8>,
    pub action_type: NeighborhoodActionType,
    pub timestamp: DateTime<Utc>,
    /// Earliest time the processor may execute this action.
    pub execute_after: DateTime<Utc>,
    /// Always unset for actions emitted by the core; other variants of
    /// [`NeighborhoodActionType`] consumed by the external processor may
    /// use these fields.
    pub target_identity_id: Option<Vec<u8>>,
    pub additional_data: Option<Vec<u8>>,
}

/// The core emits only [`AddNeighbor`](Self::AddNeighbor) and
/// [`RemoveNeighbor`](Self::RemoveNeighbor); other variants exist for the
/// external Action Processor and are never constructed here.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum NeighborhoodActionType {
    AddNeighbor,
    RemoveNeighbor,
}

/// Validates a micro-degree latitude/longitude pair against the wire
/// format's validity predicate (§3): in-range, and not the sentinel
/// "no location" value.
pub fn location_is_valid(latitude: i32, longitude: i32) -> bool {
    if latitude == LOCATION_UNSET || longitude == LOCATION_UNSET {
        return false;
    }
    (LATITUDE_MIN..=LATITUDE_MAX).contains(&latitude)
        && (LONGITUDE_MIN..=LONGITUDE_MAX).contains(&longitude)
}
