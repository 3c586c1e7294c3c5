//! KNXnet/IP Tunneling Client
//!
//! This module provides a tunneling client for communicating with KNX gateways
//! over IP networks. The client handles connection management, heartbeat, and
//! reliable message delivery.
//!
//! ## Features
//!
//! - Connection management (CONNECT/DISCONNECT)
//! - Heartbeat / keep-alive (CONNECTIONSTATE)
//! - Reliable message delivery with ACK
//! - Sequence counter management
//! - State machine for connection lifecycle
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx::protocol::tunnel::TunnelClient;
//!
//! let mut client = TunnelClient::new([192, 168, 1, 10], 3671);
//! client.connect()?;
//! client.send_cemi(&cemi_frame)?;
//! let response = client.receive()?;
//! client.disconnect()?;
//! ```

use crate::error::{KnxError, Result};
use crate::protocol::constants::*;
use crate::protocol::frame::{Hpai, KnxnetIpFrame};
use crate::protocol::services::*;

/// Maximum buffer size for frames
const BUFFER_SIZE: usize = MAX_FRAME_SIZE;

/// Outcome of processing an inbound TUNNELING_REQUEST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunnelingOutcome<'a> {
    /// A new request in sequence; the cEMI payload should be dispatched.
    New(&'a [u8]),
    /// A retransmit of the previously processed request; ack it again
    /// but do not dispatch the payload a second time.
    Duplicate,
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Idle,
    /// Connection request sent, waiting for response
    Connecting,
    /// Connected and ready
    Connected,
    /// Disconnect request sent
    Disconnecting,
}

/// Tunneling client for KNX gateway communication
///
/// This client manages a stateful connection to a KNXnet/IP gateway,
/// handling all protocol details including sequence counters, heartbeat,
/// and acknowledgments.
///
/// ## State Machine
///
/// ```text
/// Idle → Connecting → Connected → Disconnecting → Idle
///         ↓ (error)     ↓ (timeout)
///         Idle          Idle
/// ```
pub struct TunnelClient {
    /// Gateway IP address
    gateway_addr: [u8; 4],
    /// Gateway port
    gateway_port: u16,
    /// Current connection state
    state: ConnectionState,
    /// Communication channel ID (assigned by gateway)
    channel_id: u8,
    /// Send sequence counter (wraps at 256)
    send_sequence: u8,
    /// Receive sequence counter (expected)
    recv_sequence: u8,
    /// Local control endpoint
    control_endpoint: Hpai,
    /// Local data endpoint
    data_endpoint: Hpai,
    /// Buffer for building frames
    tx_buffer: [u8; BUFFER_SIZE],
    /// Buffer for receiving frames
    #[allow(dead_code)]
    rx_buffer: [u8; BUFFER_SIZE],
}

impl TunnelClient {
    /// Create a new tunnel client
    ///
    /// # Arguments
    /// * `gateway_addr` - IP address of the KNX gateway
    /// * `gateway_port` - Port number (typically 3671)
    ///
    /// # Example
    /// ```rust,no_run
    /// let client = TunnelClient::new([192, 168, 1, 10], 3671);
    /// ```
    pub fn new(gateway_addr: [u8; 4], gateway_port: u16) -> Self {
        // Use NAT mode (0.0.0.0:0) - gateway will respond to source address
        let nat_endpoint = Hpai::new([0, 0, 0, 0], 0);

        Self {
            gateway_addr,
            gateway_port,
            state: ConnectionState::Idle,
            channel_id: 0,
            send_sequence: 0,
            recv_sequence: 0,
            control_endpoint: nat_endpoint,
            data_endpoint: nat_endpoint,
            tx_buffer: [0u8; BUFFER_SIZE],
            rx_buffer: [0u8; BUFFER_SIZE],
        }
    }

    /// Get current connection state
    #[inline]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if connected
    #[inline]
    pub const fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected)
    }

    /// Get assigned channel ID
    #[inline]
    pub const fn channel_id(&self) -> u8 {
        self.channel_id
    }

    /// Get gateway address
    #[inline]
    pub const fn gateway_addr(&self) -> ([u8; 4], u16) {
        (self.gateway_addr, self.gateway_port)
    }

    /// Next sequence number this client expects from the gateway.
    #[inline]
    pub(crate) const fn recv_sequence(&self) -> u8 {
        self.recv_sequence
    }

    /// Build a CONNECT_REQUEST frame
    ///
    /// Returns the frame data and length
    pub(crate) fn build_connect_request(&mut self) -> Result<&[u8]> {
        let request = ConnectRequest::new(self.control_endpoint, self.data_endpoint);
        let len = request.build(&mut self.tx_buffer)?;
        Ok(&self.tx_buffer[..len])
    }

    /// Build a CONNECTIONSTATE_REQUEST frame
    pub(crate) fn build_connectionstate_request(&mut self) -> Result<&[u8]> {
        let request = ConnectionStateRequest::new(self.channel_id, self.control_endpoint);
        let len = request.build(&mut self.tx_buffer)?;
        Ok(&self.tx_buffer[..len])
    }

    /// Build a DISCONNECT_REQUEST frame
    pub(crate) fn build_disconnect_request(&mut self) -> Result<&[u8]> {
        let request = DisconnectRequest::new(self.channel_id, self.control_endpoint);
        let len = request.build(&mut self.tx_buffer)?;
        Ok(&self.tx_buffer[..len])
    }

    /// Build a TUNNELING_REQUEST frame
    ///
    /// # Arguments
    /// * `cemi_data` - cEMI frame data to send
    ///
    /// # Returns
    /// The frame data and increments send sequence counter
    pub(crate) fn build_tunneling_request(&mut self, cemi_data: &[u8]) -> Result<&[u8]> {
        let header = ConnectionHeader::new(self.channel_id, self.send_sequence);
        let request = TunnelingRequest::new(header, cemi_data);
        let len = request.build(&mut self.tx_buffer)?;

        // Increment sequence counter (wraps at 256)
        self.send_sequence = self.send_sequence.wrapping_add(1);

        Ok(&self.tx_buffer[..len])
    }

    /// Build a TUNNELING_ACK frame
    ///
    /// # Arguments
    /// * `sequence` - Sequence number to acknowledge
    /// * `status` - Status code (0 = OK)
    pub(crate) fn build_tunneling_ack(&mut self, sequence: u8, status: u8) -> Result<&[u8]> {
        let header = ConnectionHeader::new(self.channel_id, sequence);
        let ack = TunnelingAck::new(header, status);
        let len = ack.build(&mut self.tx_buffer)?;
        Ok(&self.tx_buffer[..len])
    }

    /// Parse a received frame
    ///
    /// # Arguments
    /// * `data` - Frame data received from network
    ///
    /// # Returns
    /// Parsed frame or error
    #[allow(dead_code)]
    fn parse_frame<'a>(&self, data: &'a [u8]) -> Result<KnxnetIpFrame<'a>> {
        KnxnetIpFrame::parse(data)
    }

    /// Handle CONNECT_RESPONSE
    ///
    /// Updates state and stores channel ID if successful
    pub(crate) fn handle_connect_response(&mut self, body: &[u8]) -> Result<()> {
        let response = ConnectResponse::parse(body)?;

        if !response.is_ok() {
            self.state = ConnectionState::Idle;
            return Err(KnxError::connection_failed());
        }

        self.channel_id = response.channel_id;
        self.send_sequence = 0;
        self.recv_sequence = 0;
        self.state = ConnectionState::Connected;

        Ok(())
    }

    /// Handle CONNECTIONSTATE_RESPONSE
    #[allow(dead_code)]
    pub(crate) fn handle_connectionstate_response(&mut self, body: &[u8]) -> Result<()> {
        let response = ConnectionStateResponse::parse(body)?;

        if !response.is_ok() {
            // Connection lost or error
            self.state = ConnectionState::Idle;
            return Err(KnxError::connection_lost());
        }

        Ok(())
    }

    /// Handle DISCONNECT_RESPONSE
    pub(crate) fn handle_disconnect_response(&mut self, body: &[u8]) -> Result<()> {
        let _response = DisconnectResponse::parse(body)?;

        // Always go to idle, even if response indicates error
        self.state = ConnectionState::Idle;
        self.channel_id = 0;
        self.send_sequence = 0;
        self.recv_sequence = 0;

        Ok(())
    }

    /// Handle TUNNELING_REQUEST (indication from gateway).
    ///
    /// A sequence number equal to the expected counter is accepted and
    /// dispatched normally. A sequence number equal to the *previous*
    /// counter is a retransmit of an already-acknowledged request (the
    /// gateway's ACK was lost) and is deduplicated silently rather than
    /// treated as an error. Any other sequence number is a genuine
    /// mismatch, usually indicating lost frames, and is rejected.
    pub(crate) fn handle_tunneling_request<'a>(&mut self, body: &'a [u8]) -> Result<TunnelingOutcome<'a>> {
        let request = TunnelingRequest::parse(body)?;
        let received = request.connection_header.sequence_counter;

        if received == self.recv_sequence {
            self.recv_sequence = self.recv_sequence.wrapping_add(1);
            return Ok(TunnelingOutcome::New(request.cemi_data));
        }

        if received == self.recv_sequence.wrapping_sub(1) {
            return Ok(TunnelingOutcome::Duplicate);
        }

        Err(KnxError::sequence_mismatch())
    }

    /// Handle TUNNELING_ACK
    ///
    /// Verifies the ACK matches our last sent sequence
    pub(crate) fn handle_tunneling_ack(&self, body: &[u8]) -> Result<()> {
        let ack = TunnelingAck::parse(body)?;

        if !ack.is_ok() {
            return Err(KnxError::tunneling_ack_failed());
        }

        // Note: Sequence verification should be done by caller tracking sent requests
        // Here we just verify the ACK status

        Ok(())
    }

    /// Reset connection state
    ///
    /// Useful for error recovery
    pub fn reset(&mut self) {
        self.state = ConnectionState::Idle;
        self.channel_id = 0;
        self.send_sequence = 0;
        self.recv_sequence = 0;
    }
}

// Note: Actual network I/O will be added in Phase 4 (Embassy integration)
// For now, this provides the protocol state machine and frame building
