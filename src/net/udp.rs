//! Tokio UDP socket adapter for `AsyncTransport`.
//!
//! This is the production transport: it wraps `tokio::net::UdpSocket` and
//! implements `AsyncTransport`, so it can be handed to `AsyncTunnelClient`
//! and `scanner` the same way a `MockTransport` is handed to them in tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx::net::udp::UdpTransport;
//!
//! # async fn run() -> knx::Result<()> {
//! let transport = UdpTransport::bind(0).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{KnxError, Result};
use crate::net::transport::AsyncTransport;
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;

/// `AsyncTransport` backed by a real `tokio::net::UdpSocket`.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind a UDP socket on `0.0.0.0:port` (port 0 picks any free port).
    pub async fn bind(port: u16) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", port))
            .await
            .map_err(|_| KnxError::socket_error())?;

        Ok(Self { socket })
    }

    /// Enable broadcast on the underlying socket, required for KNXnet/IP
    /// gateway discovery via UDP broadcast `SEARCH_REQUEST`.
    pub fn set_broadcast(&self, on: bool) -> Result<()> {
        self.socket
            .set_broadcast(on)
            .map_err(|_| KnxError::socket_error())
    }

    /// The local address this socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(|_| KnxError::not_bound())
    }

    /// Join an IPv4 multicast group on `interface` (`Ipv4Addr::UNSPECIFIED`
    /// to let the OS pick the default route), required for KNXnet/IP
    /// routing.
    pub fn join_multicast_v4(&self, group: Ipv4Addr, interface: Ipv4Addr) -> Result<()> {
        self.socket
            .join_multicast_v4(group, interface)
            .map_err(|_| KnxError::socket_error())
    }

    /// Leave a previously joined IPv4 multicast group.
    pub fn leave_multicast_v4(&self, group: Ipv4Addr, interface: Ipv4Addr) -> Result<()> {
        self.socket
            .leave_multicast_v4(group, interface)
            .map_err(|_| KnxError::socket_error())
    }

    /// Set the time-to-live for outgoing multicast datagrams.
    pub fn set_multicast_ttl_v4(&self, ttl: u32) -> Result<()> {
        self.socket
            .set_multicast_ttl_v4(ttl)
            .map_err(|_| KnxError::socket_error())
    }
}

impl AsyncTransport for UdpTransport {
    async fn send_to(&mut self, data: &[u8], addr: SocketAddr) -> Result<()> {
        self.socket
            .send_to(data, addr)
            .await
            .map_err(|_| KnxError::send_failed())?;
        Ok(())
    }

    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket
            .recv_from(buf)
            .await
            .map_err(|_| KnxError::receive_failed())
    }

    fn is_ready(&self) -> bool {
        self.socket.local_addr().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_any_port() {
        let transport = UdpTransport::bind(0).await.unwrap();
        assert!(transport.local_addr().unwrap().port() > 0);
    }

    #[tokio::test]
    async fn join_and_leave_multicast_group() {
        let transport = UdpTransport::bind(0).await.unwrap();
        let group = Ipv4Addr::new(224, 0, 23, 12);
        transport.join_multicast_v4(group, Ipv4Addr::UNSPECIFIED).unwrap();
        transport.leave_multicast_v4(group, Ipv4Addr::UNSPECIFIED).unwrap();
    }

    #[tokio::test]
    async fn loopback_round_trip() {
        let mut a = UdpTransport::bind(0).await.unwrap();
        let mut b = UdpTransport::bind(0).await.unwrap();
        let b_addr = b.local_addr().unwrap();

        a.send_to(&[0xAA, 0xBB, 0xCC], b_addr).await.unwrap();

        let mut buf = [0u8; 16];
        let (n, _from) = b.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0xBB, 0xCC]);
    }
}
