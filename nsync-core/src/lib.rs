//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The Neighborhood Synchronization Core of a decentralized, location-based
//! profile server: a durable session to the Location-Based Network node,
//! reconciled into a consistent local neighborhood under transactional
//! locking, with neighborhood changes enqueued for an external Action
//! Processor.

pub mod config;
pub mod debug;
pub mod error;
pub mod model;
pub mod packet;
pub mod reconciler;
pub mod repository;
pub mod session;
pub mod signal;
pub mod tasks;
pub mod transport;

pub use config::Config;
pub use error::Error;
pub use model::{Neighbor, NeighborhoodAction, NeighborhoodActionType};
pub use session::Session;
pub use tasks::CoreHandle;
