//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Length-prefixed framing over a single TCP connection to the LBN node
//! (§4.1). One writer at a time, serialized through a mutex; exactly one
//! reader (the session engine's receive loop).

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use crate::debug::Debug;
use crate::error::{Error, IoError};
#[cfg(not(feature = "testing"))]
use nsync_utils::socket::TcpStreamExt;

/// Frames larger than this are rejected as a protocol violation rather
/// than accepted and possibly exhausting memory.
pub const MAX_FRAME_LEN: u32 = 1 << 20;

const LENGTH_PREFIX_SIZE: usize = 4;

/// A length-prefixed, single-writer framed connection to the LBN node.
pub struct FramedTransport {
    reader: OwnedReadHalf,
    writer: Mutex<OwnedWriteHalf>,
}

/// Outcome of a [`FramedTransport::read_frame`] call.
pub enum ReadOutcome {
    Frame(Bytes),
    Eof,
}

impl FramedTransport {
    pub fn new(stream: TcpStream) -> FramedTransport {
        let (reader, writer) = stream.into_split();
        FramedTransport {
            reader,
            writer: Mutex::new(writer),
        }
    }

    /// Connects to the LBN node, cancellable by the caller via
    /// `tokio::select!` around this future (§5, suspension point 1).
    pub async fn connect(
        addr: std::net::SocketAddr,
    ) -> Result<FramedTransport, Error> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(IoError::Connect)?;
        #[cfg(not(feature = "testing"))]
        if let Ok(conn_info) = stream.conn_info() {
            Debug::SessionConnected(&conn_info).log();
        }
        Ok(FramedTransport::new(stream))
    }

    /// Reads one length-prefixed frame, or reports EOF.
    ///
    /// A short read after a non-empty length prefix, or a length outside
    /// [`MAX_FRAME_LEN`], is a protocol violation (§4.1).
    pub async fn read_frame(&mut self) -> Result<ReadOutcome, Error> {
        let mut len_buf = [0u8; LENGTH_PREFIX_SIZE];
        match self.reader.read_exact(&mut len_buf).await {
            Ok(_) => {}
            Err(error)
                if error.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                return Ok(ReadOutcome::Eof);
            }
            Err(error) => return Err(IoError::Read(error).into()),
        }

        let len = u32::from_be_bytes(len_buf);
        if len > MAX_FRAME_LEN {
            return Err(Error::Decode(
                crate::packet::DecodeError::ReadOutOfBounds,
            ));
        }

        let mut body = BytesMut::zeroed(len as usize);
        match self.reader.read_exact(&mut body).await {
            Ok(_) => {}
            Err(error)
                if error.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                return Err(Error::Decode(
                    crate::packet::DecodeError::ReadOutOfBounds,
                ));
            }
            Err(error) => return Err(IoError::Read(error).into()),
        }

        Ok(ReadOutcome::Frame(body.freeze()))
    }

    /// Writes one length-prefixed frame. Serializes with other writers
    /// through an internal mutex (§4.1, §5 suspension point 3).
    pub async fn write_frame(&self, body: &[u8]) -> Result<(), Error> {
        let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + body.len());
        frame.put_u32(body.len() as u32);
        frame.put_slice(body);

        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await.map_err(IoError::Write)?;
        writer.flush().await.map_err(IoError::Write)?;
        Ok(())
    }
}

impl std::fmt::Debug for FramedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramedTransport").finish_non_exhaustive()
    }
}
