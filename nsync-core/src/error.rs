//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{error, info, warn, warn_span};

use crate::packet::DecodeError;

/// Errors raised by the neighborhood synchronization core.
///
/// No exceptions cross a component boundary (§4.3, §7): every fallible
/// operation in this crate returns one of these variants.
#[derive(Debug)]
pub enum Error {
    IoError(IoError),
    /// Decoding the wire envelope or its body failed.
    Decode(DecodeError),
    /// The peer closed the connection while a request/response or the
    /// receive/dispatch loop was still in progress.
    UnexpectedEof,
    /// A response carried a correlation ID or category path that did not
    /// match any in-flight request.
    UnmatchedCorrelation(u32),
    /// A request of a kind the core does not handle arrived over the
    /// session.
    UnexpectedRequestKind,
    /// A response arrived without a matching in-flight request.
    UnsolicitedResponse(u32),
    /// The LBN node answered a request with a non-`Ok` status.
    RequestRejected,
    /// The repository/unit-of-work layer failed during a transaction.
    Persistence(String),
    /// A reconciler item failed validation (§7 "Validation"): bad
    /// identifier length, out-of-range port, or invalid location. The item
    /// is skipped and the batch continues.
    InvalidIdentifierLength { server_id: Vec<u8>, len: usize },
    InvalidPort { server_id: Vec<u8> },
    InvalidLocation {
        server_id: Vec<u8>,
        latitude: i32,
        longitude: i32,
    },
    /// The neighborhood was already at `max_neighborhood_size` (§7
    /// "Capacity"). The item is skipped and the batch continues.
    CapacityReached { server_id: Vec<u8>, max: usize },
}

/// I/O-originated errors, kept separate so [`Error::log`] can route them to
/// the same severity regardless of which higher-level variant wraps them.
#[derive(Debug)]
pub enum IoError {
    Connect(std::io::Error),
    Read(std::io::Error),
    Write(std::io::Error),
}

// ===== impl Error =====

impl Error {
    /// Logs this error via `tracing`, at a severity appropriate to its
    /// taxonomy (§7): transport/protocol errors warn, persistence failures
    /// are escalated to error.
    pub fn log(&self) {
        match self {
            Error::IoError(error) => error.log(),
            Error::Decode(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
            Error::UnexpectedEof => {
                info!("{}", self);
            }
            Error::UnmatchedCorrelation(id) => {
                warn_span!("session").in_scope(|| {
                    warn!(id, "{}", self);
                });
            }
            Error::UnexpectedRequestKind => {
                warn!("{}", self);
            }
            Error::UnsolicitedResponse(id) => {
                warn!(id, "{}", self);
            }
            Error::RequestRejected => {
                warn!("{}", self);
            }
            Error::Persistence(detail) => {
                error!(%detail, "{}", self);
            }
            Error::InvalidIdentifierLength { server_id, len } => {
                error!(server_id = %hex(server_id), len, "{}", self);
            }
            Error::InvalidPort { server_id } => {
                error!(server_id = %hex(server_id), "{}", self);
            }
            Error::InvalidLocation {
                server_id,
                latitude,
                longitude,
            } => {
                error!(server_id = %hex(server_id), latitude, longitude, "{}", self);
            }
            Error::CapacityReached { server_id, max } => {
                error!(server_id = %hex(server_id), max, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(error) => error.fmt(f),
            Error::Decode(..) => write!(f, "failed to decode message"),
            Error::UnexpectedEof => {
                write!(f, "connection closed by peer")
            }
            Error::UnmatchedCorrelation(..) => {
                write!(f, "response correlation id does not match any request")
            }
            Error::UnexpectedRequestKind => {
                write!(f, "unexpected request kind")
            }
            Error::UnsolicitedResponse(..) => {
                write!(f, "response arrived without a matching request")
            }
            Error::RequestRejected => {
                write!(f, "LBN node rejected request")
            }
            Error::Persistence(..) => {
                write!(f, "transaction failed")
            }
            Error::InvalidIdentifierLength { .. } => {
                write!(f, "identifier length does not match configuration")
            }
            Error::InvalidPort { .. } => write!(f, "port out of range"),
            Error::InvalidLocation { .. } => write!(f, "invalid location"),
            Error::CapacityReached { .. } => {
                write!(f, "neighborhood at capacity, skipping neighbor")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(error) => Some(error),
            Error::Decode(error) => Some(error),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

impl From<DecodeError> for Error {
    fn from(error: DecodeError) -> Error {
        Error::Decode(error)
    }
}

// ===== impl IoError =====

impl IoError {
    pub(crate) fn log(&self) {
        match self {
            IoError::Connect(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
            IoError::Read(error) | IoError::Write(error) => {
                warn!(error = %with_source(error), "{}", self);
            }
        }
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::Connect(..) => write!(f, "failed to connect to LBN node"),
            IoError::Read(..) => write!(f, "failed to read from LBN session"),
            IoError::Write(..) => write!(f, "failed to write to LBN session"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IoError::Connect(error)
            | IoError::Read(error)
            | IoError::Write(error) => Some(error),
        }
    }
}

// ===== global functions =====

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}

/// Lowercase hex encoding, used when logging identifiers that are
/// meaningless as raw bytes.
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
