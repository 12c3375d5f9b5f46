//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Small, protocol-agnostic runtime helpers shared by the neighborhood
//! synchronization core: cancellable task handles, a TCP connection info
//! helper, and byte-buffer extension traits for the wire codec.

pub mod bytes;
pub mod socket;
pub mod task;
