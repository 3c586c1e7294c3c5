//! Async KNXnet/IP tunnelling client.
//!
//! This wraps the [`TunnelClient`] protocol state machine with real async
//! I/O over any [`AsyncTransport`] (a `UdpTransport` in production, a
//! `MockTransport` in tests), adding timeouts, heartbeat/keep-alive, and
//! reconnect bookkeeping.
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx::net::udp::UdpTransport;
//! use knx::protocol::async_tunnel::AsyncTunnelClient;
//!
//! # async fn run() -> knx::Result<()> {
//! let transport = UdpTransport::bind(0).await?;
//! let mut client = AsyncTunnelClient::new(transport, [192, 168, 1, 10], 3671);
//!
//! client.connect().await?;
//! client.send_cemi(&[0x11, 0x00, 0xBC, 0xE0, 0x11, 0xFF, 0x01]).await?;
//!
//! if let Some(cemi) = client.receive().await? {
//!     // process cEMI frame
//!     let _ = cemi;
//! }
//!
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{KnxError, Result};
use crate::net::transport::AsyncTransport;
use crate::protocol::constants::*;
use crate::protocol::frame::KnxnetIpFrame;
use crate::protocol::tunnel::{TunnelClient, TunnelingOutcome};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Timeout waiting for CONNECT_RESPONSE.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout waiting for a control-exchange response (ack, disconnect, heartbeat).
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Interval between CONNECTIONSTATE_REQUEST heartbeats while connected.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Consecutive heartbeat failures before the connection is considered lost.
pub const MAX_HEARTBEAT_FAILURES: u32 = 3;

/// Maximum UDP datagram size for KNXnet/IP.
const MAX_PACKET_SIZE: usize = 512;

/// Async wrapper around [`TunnelClient`] driving a generic [`AsyncTransport`].
pub struct AsyncTunnelClient<T: AsyncTransport> {
    transport: T,
    gateway: SocketAddr,
    client: TunnelClient,
    rx_buffer: [u8; MAX_PACKET_SIZE],
    heartbeat_failures: u32,
}

impl<T: AsyncTransport> AsyncTunnelClient<T> {
    /// Create a new async tunnel client over `transport`, targeting the
    /// gateway at `gateway_addr:gateway_port`. The transport is not bound
    /// until [`connect`](Self::connect) is called.
    pub fn new(transport: T, gateway_addr: [u8; 4], gateway_port: u16) -> Self {
        Self {
            transport,
            gateway: SocketAddr::from((gateway_addr, gateway_port)),
            client: TunnelClient::new(gateway_addr, gateway_port),
            rx_buffer: [0u8; MAX_PACKET_SIZE],
            heartbeat_failures: 0,
        }
    }

    /// Send `data` to the gateway and wait for a reply, returning the
    /// number of bytes received into `rx_buffer`.
    async fn exchange(&mut self, data: &[u8], wait: Duration) -> Result<usize> {
        self.transport.send_to(data, self.gateway).await?;

        let (n, _from) = timeout(wait, self.transport.recv_from(&mut self.rx_buffer))
            .await
            .map_err(|_| KnxError::connection_timeout())??;

        Ok(n)
    }

    /// Connect to the gateway: send CONNECT_REQUEST, wait for
    /// CONNECT_RESPONSE, and transition the tunnel state machine.
    pub async fn connect(&mut self) -> Result<()> {
        self.transport.bind(0)?;

        let request = self.client.build_connect_request()?.to_vec();
        let n = self.exchange(&request, CONNECT_TIMEOUT).await?;

        let frame = KnxnetIpFrame::parse(&self.rx_buffer[..n])?;
        if frame.service_type() != ServiceType::ConnectResponse {
            return Err(KnxError::invalid_frame());
        }

        self.client.handle_connect_response(frame.body())?;
        self.heartbeat_failures = 0;
        debug!(channel_id = self.client.channel_id(), "tunnel connected");

        Ok(())
    }

    /// Send a cEMI frame over the tunnel and wait for the gateway's
    /// TUNNELING_ACK. Retransmits once on ack timeout before giving up.
    pub async fn send_cemi(&mut self, cemi_data: &[u8]) -> Result<()> {
        if !self.client.is_connected() {
            return Err(KnxError::not_connected());
        }

        let request = self.client.build_tunneling_request(cemi_data)?.to_vec();

        for attempt in 0..2 {
            self.transport.send_to(&request, self.gateway).await?;

            let result = timeout(RESPONSE_TIMEOUT, self.transport.recv_from(&mut self.rx_buffer)).await;
            let Ok(Ok((n, _from))) = result else {
                if attempt == 0 {
                    warn!("tunnelling ack timed out, retransmitting");
                    continue;
                }
                return Err(KnxError::connection_timeout());
            };

            let frame = KnxnetIpFrame::parse(&self.rx_buffer[..n])?;
            if frame.service_type() == ServiceType::TunnellingAck {
                self.client.handle_tunneling_ack(frame.body())?;
            }
            return Ok(());
        }

        Err(KnxError::connection_timeout())
    }

    /// Poll for an inbound TUNNELING_REQUEST, acking it and returning its
    /// cEMI payload. Returns `Ok(None)` if nothing arrives within a short
    /// window; non-tunnelling service types are silently ignored.
    pub async fn receive(&mut self) -> Result<Option<Vec<u8>>> {
        if !self.client.is_connected() {
            return Err(KnxError::not_connected());
        }

        let result = timeout(Duration::from_millis(100), self.transport.recv_from(&mut self.rx_buffer)).await;

        let (n, _from) = match result {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Ok(None),
        };

        let frame = KnxnetIpFrame::parse(&self.rx_buffer[..n])?;
        if frame.service_type() != ServiceType::TunnellingRequest {
            return Ok(None);
        }

        let outcome = self.client.handle_tunneling_request(frame.body())?;
        let cemi_data = match outcome {
            TunnelingOutcome::New(data) => Some(data.to_vec()),
            TunnelingOutcome::Duplicate => None,
        };

        let ack_sequence = self.client.recv_sequence().wrapping_sub(1);
        let ack = self.client.build_tunneling_ack(ack_sequence, 0)?.to_vec();
        self.transport.send_to(&ack, self.gateway).await?;

        Ok(cemi_data)
    }

    /// Send a CONNECTIONSTATE_REQUEST and wait for the response. Returns
    /// `Ok(())` on success; on failure, bumps the consecutive-failure
    /// counter and returns `Err(KnxError)` once it reaches
    /// [`MAX_HEARTBEAT_FAILURES`] (signalling the caller should reconnect).
    pub async fn heartbeat(&mut self) -> Result<()> {
        let request = self.client.build_connectionstate_request()?.to_vec();

        let outcome: Result<()> = async {
            let n = self.exchange(&request, RESPONSE_TIMEOUT).await?;
            let frame = KnxnetIpFrame::parse(&self.rx_buffer[..n])?;
            if frame.service_type() != ServiceType::ConnectionstateResponse {
                return Err(KnxError::invalid_frame());
            }
            self.client.handle_connectionstate_response(frame.body())
        }
        .await;

        match outcome {
            Ok(()) => {
                self.heartbeat_failures = 0;
                Ok(())
            }
            Err(err) => {
                self.heartbeat_failures += 1;
                warn!(failures = self.heartbeat_failures, "heartbeat failed");
                if self.heartbeat_failures >= MAX_HEARTBEAT_FAILURES {
                    Err(KnxError::connection_lost())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Disconnect from the gateway (best-effort: the DISCONNECT_RESPONSE
    /// is awaited but its absence doesn't fail the call).
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.client.is_connected() {
            return Ok(());
        }

        let request = self.client.build_disconnect_request()?.to_vec();
        self.transport.send_to(&request, self.gateway).await?;

        if let Ok(Ok((n, _))) = timeout(RESPONSE_TIMEOUT, self.transport.recv_from(&mut self.rx_buffer)).await {
            if let Ok(frame) = KnxnetIpFrame::parse(&self.rx_buffer[..n]) {
                let _ = self.client.handle_disconnect_response(frame.body());
            }
        }

        self.client.reset();
        self.transport.close();
        self.heartbeat_failures = 0;

        Ok(())
    }

    /// Whether the tunnel is currently connected.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Consecutive heartbeat failures observed since the last success.
    pub fn heartbeat_failures(&self) -> u32 {
        self.heartbeat_failures
    }

    /// Gateway address this client targets.
    pub fn gateway_addr(&self) -> SocketAddr {
        self.gateway
    }
}
