//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::IpAddr;

/// Read-only configuration snapshot consumed by the neighborhood
/// synchronization core.
///
/// Loading this from a file or CLI is outside the core's responsibility;
/// callers construct one and pass it in.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address and port of the LBN node to connect to.
    pub lbn_endpoint: (IpAddr, u16),
    /// This server's own address, advertised to the LBN during
    /// registration.
    pub server_interface: IpAddr,
    /// Port on which this server answers the peer-to-peer profile exchange
    /// protocol (out of scope here, but advertised to the LBN so other
    /// neighbors can reach it).
    pub primary_role_port: u16,
    /// Keys used to derive this server's 32-byte network identity.
    pub identity_keys: IdentityKeys,
    /// Upper bound on the number of concurrently tracked neighbors.
    pub max_neighborhood_size: usize,
    /// Expected length, in bytes, of a neighbor identifier (32).
    pub identifier_length: usize,
}

/// The subset of this server's cryptographic identity the core needs:
/// enough to derive a stable 32-byte network ID. Full keypair management
/// (generation, storage, signing) is out of scope.
#[derive(Clone, Debug)]
pub struct IdentityKeys {
    pub public_key: Vec<u8>,
}

impl IdentityKeys {
    /// Derives this server's 32-byte network identity as the SHA-256 digest
    /// of its public key, per the external crypto contract in §6.2.
    pub fn network_id(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(&self.public_key);
        hasher.finalize().into()
    }
}

impl Config {
    pub const IDENTIFIER_LENGTH: usize = 32;
}
