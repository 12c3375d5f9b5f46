//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::io::Result;
use std::net::IpAddr;

#[cfg(not(feature = "testing"))]
pub use tokio::net::{TcpStream, tcp::OwnedReadHalf, tcp::OwnedWriteHalf};

/// Local/remote address and port pair for an established TCP connection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TcpConnInfo {
    pub local_addr: IpAddr,
    pub local_port: u16,
    pub remote_addr: IpAddr,
    pub remote_port: u16,
}

/// Extension methods for [`TcpStream`].
pub trait TcpStreamExt {
    /// Returns address and port information about the TCP connection.
    fn conn_info(&self) -> Result<TcpConnInfo>;
}

#[cfg(not(feature = "testing"))]
impl TcpStreamExt for TcpStream {
    fn conn_info(&self) -> Result<TcpConnInfo> {
        let local_addr = self.local_addr()?;
        let remote_addr = self.peer_addr()?;

        Ok(TcpConnInfo {
            local_addr: local_addr.ip(),
            local_port: local_addr.port(),
            remote_addr: remote_addr.ip(),
            remote_port: remote_addr.port(),
        })
    }
}

#[cfg(feature = "testing")]
pub mod mock {
    use super::*;

    /// Stand-in for [`TcpStream`] in unit tests, where no real socket exists.
    #[derive(Debug)]
    pub struct TcpStream {}

    impl TcpStreamExt for TcpStream {
        fn conn_info(&self) -> Result<TcpConnInfo> {
            unreachable!()
        }
    }
}
