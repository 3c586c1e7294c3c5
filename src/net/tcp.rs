//! Tokio TCP stream adapter for `AsyncTransport`.
//!
//! Unlike UDP, TCP carries no datagram framing: a single `read` can return
//! any number of bytes of one frame, several frames, or a fragment of a
//! frame. `TCPTransport` reassembles whole KNXnet/IP frames using the
//! header's `total_length` field before handing them to the caller, reading
//! the fixed 6-byte header first and then exactly the remaining body bytes,
//! looping under the hood via `read_exact` until each piece is complete.
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx::net::tcp::TCPTransport;
//!
//! # async fn run() -> knx::Result<()> {
//! let transport = TCPTransport::connect(([192, 168, 1, 10], 3671).into()).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{KnxError, Result};
use crate::net::transport::AsyncTransport;
use crate::protocol::frame::KnxnetIpHeader;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// `AsyncTransport` backed by a real `tokio::net::TcpStream`.
///
/// KNXnet/IP TCP tunnelling (core v2) is a single persistent connection to
/// one gateway, so `send_to`/`recv_from`'s `addr` parameter is the peer
/// address fixed at connect time rather than a per-call destination.
#[derive(Debug)]
pub struct TCPTransport {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TCPTransport {
    /// Connect to a KNXnet/IP gateway over TCP.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|_| KnxError::connection_failed())?;
        Ok(Self { stream, peer: addr })
    }

    /// The remote gateway address this stream is connected to.
    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Read one complete KNXnet/IP frame (header + body) into `buf`,
    /// reassembling across as many partial reads as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection closes mid-frame, the header is
    /// invalid, or `buf` is too small for the frame's declared total length.
    async fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < KnxnetIpHeader::SIZE {
            return Err(KnxError::buffer_too_small());
        }

        self.stream
            .read_exact(&mut buf[..KnxnetIpHeader::SIZE])
            .await
            .map_err(|_| KnxError::receive_failed())?;

        let header = KnxnetIpHeader::parse(&buf[..KnxnetIpHeader::SIZE])?;
        let total_len = header.total_length as usize;

        if total_len < KnxnetIpHeader::SIZE {
            return Err(KnxError::invalid_frame());
        }
        if total_len > buf.len() {
            return Err(KnxError::buffer_too_small());
        }

        self.stream
            .read_exact(&mut buf[KnxnetIpHeader::SIZE..total_len])
            .await
            .map_err(|_| KnxError::receive_failed())?;

        Ok(total_len)
    }
}

impl AsyncTransport for TCPTransport {
    async fn send_to(&mut self, data: &[u8], _addr: SocketAddr) -> Result<()> {
        self.stream
            .write_all(data)
            .await
            .map_err(|_| KnxError::send_failed())
    }

    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let n = self.read_frame(buf).await?;
        Ok((n, self.peer))
    }

    fn is_ready(&self) -> bool {
        self.stream.peer_addr().is_ok()
    }
}
