//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span};

use crate::error::hex;
use crate::session::fsm;
use nsync_utils::socket::TcpConnInfo;

/// Debug messages for the neighborhood synchronization core.
#[derive(Debug)]
pub enum Debug<'a> {
    SessionFsmTransition(&'a fsm::State, &'a fsm::Event, &'a fsm::State),
    SessionConnecting,
    SessionConnected(&'a TcpConnInfo),
    SessionReconnectScheduled,
    SessionRegistering,
    SessionInitialSyncRequested,
    SessionInitialized,
    SessionMsgRx(&'a str),
    SessionMsgTx(&'a str),
    SessionDeregistering,
    RemoveOfUnknownNeighbor(&'a [u8]),
}

impl<'a> Debug<'a> {
    pub(crate) fn log(&self) {
        match self {
            Debug::SessionFsmTransition(old, event, new) => {
                debug_span!("session").in_scope(|| {
                    debug_span!("fsm").in_scope(|| {
                        debug!(?old, ?event, ?new, "{}", self);
                    })
                });
            }
            Debug::SessionConnecting
            | Debug::SessionReconnectScheduled
            | Debug::SessionRegistering
            | Debug::SessionInitialSyncRequested
            | Debug::SessionInitialized
            | Debug::SessionDeregistering => {
                debug_span!("session").in_scope(|| {
                    debug!("{}", self);
                });
            }
            Debug::SessionConnected(conn_info) => {
                debug_span!("session").in_scope(|| {
                    debug!(
                        local_addr = %conn_info.local_addr,
                        local_port = conn_info.local_port,
                        remote_addr = %conn_info.remote_addr,
                        remote_port = conn_info.remote_port,
                        "{}", self
                    );
                });
            }
            Debug::SessionMsgRx(kind) | Debug::SessionMsgTx(kind) => {
                debug_span!("session").in_scope(|| {
                    debug!(%kind, "{}", self);
                });
            }
            Debug::RemoveOfUnknownNeighbor(server_id) => {
                debug_span!("reconciler").in_scope(|| {
                    debug!(server_id = %hex(server_id), "{}", self);
                });
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::SessionFsmTransition(..) => write!(f, "state transition"),
            Debug::SessionConnecting => write!(f, "connecting to LBN node"),
            Debug::SessionConnected(..) => write!(f, "connected to LBN node"),
            Debug::SessionReconnectScheduled => {
                write!(f, "reconnect scheduled")
            }
            Debug::SessionRegistering => write!(f, "registering service"),
            Debug::SessionInitialSyncRequested => {
                write!(f, "requesting initial neighborhood")
            }
            Debug::SessionInitialized => write!(f, "neighborhood initialized"),
            Debug::SessionMsgRx(..) => write!(f, "message received"),
            Debug::SessionMsgTx(..) => write!(f, "message sent"),
            Debug::SessionDeregistering => write!(f, "deregistering service"),
            Debug::RemoveOfUnknownNeighbor(..) => {
                write!(f, "remove of unknown neighbor, skipping")
            }
        }
    }
}
