//! KNXnet/IP service request and response builders.
//!
//! This module provides zero-copy builders for constructing KNXnet/IP service
//! frames used in tunneling communication. All builders work with provided
//! buffers to avoid heap allocations, making them suitable for embedded systems.
//!
//! ## Supported Services
//!
//! - **CONNECT** - Establish tunnel connection with gateway
//! - **CONNECTIONSTATE** - Heartbeat/keep-alive checks
//! - **DISCONNECT** - Clean connection shutdown
//! - **TUNNELING** - Send/receive KNX telegrams through tunnel
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx::protocol::services::ConnectRequest;
//! use knx::protocol::frame::Hpai;
//!
//! // Build a connection request
//! let control = Hpai::new([192, 168, 1, 100], 3671);
//! let data = Hpai::new([192, 168, 1, 100], 3671);
//! let request = ConnectRequest::new(control, data);
//!
//! // Encode to buffer
//! let mut buffer = [0u8; 32];
//! let len = request.build(&mut buffer)?;
//! // Send buffer[..len] to gateway
//! ```
//!
//! ## Protocol Flow
//!
//! ```text
//! Client                          Gateway
//!   |                                |
//!   |------- CONNECT_REQUEST ------->|
//!   |<------ CONNECT_RESPONSE -------|
//!   |                                |
//!   |------ TUNNELING_REQUEST ------>|
//!   |<------ TUNNELING_ACK ----------|
//!   |                                |
//!   |--- CONNECTIONSTATE_REQUEST --->|  (every 60s)
//!   |<-- CONNECTIONSTATE_RESPONSE ---|
//!   |                                |
//!   |------ DISCONNECT_REQUEST ----->|
//!   |<----- DISCONNECT_RESPONSE -----|
//! ```

use crate::error::{KnxError, Result};
use crate::protocol::constants::{ServiceType, SERVICE_CONNECT_REQUEST, SERVICE_CONNECTIONSTATE_REQUEST, SERVICE_DISCONNECT_REQUEST, SERVICE_TUNNELING_REQUEST, SERVICE_TUNNELING_ACK};
use crate::protocol::dib::Dib;
use crate::protocol::frame::Hpai;
use crate::protocol::srp::Srp;

/// Write a 6-byte KNXnet/IP header (header length, version, service type,
/// total length) at the start of `buf`. Shared by every service body below
/// so the header layout stays in exactly one place.
fn write_header(buf: &mut [u8], service: ServiceType, total_len: u16) -> Result<()> {
    if buf.len() < 6 {
        return Err(KnxError::buffer_too_small());
    }
    buf[0] = 0x06;
    buf[1] = 0x10;
    buf[2..4].copy_from_slice(&service.to_u16().to_be_bytes());
    buf[4..6].copy_from_slice(&total_len.to_be_bytes());
    Ok(())
}

/// Connection Request Information (CRI) for tunneling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionRequestInfo {
    /// Connection type (`TUNNEL_CONNECTION` = 0x04)
    pub connection_type: u8,
    /// KNX layer (`TUNNEL_LINKLAYER` = 0x02)
    pub knx_layer: u8,
}

impl ConnectionRequestInfo {
    /// Create a new CRI for tunnel link layer connection
    pub const fn tunnel_link_layer() -> Self {
        Self {
            connection_type: 0x04, // TUNNEL_CONNECTION
            knx_layer: 0x02,       // TUNNEL_LINKLAYER
        }
    }

    /// Encode CRI to bytes
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 4 {
            return Err(KnxError::buffer_too_small());
        }

        buf[0] = 4; // Structure length
        buf[1] = self.connection_type;
        buf[2] = self.knx_layer;
        buf[3] = 0x00; // Reserved

        Ok(4)
    }

    /// Decode CRI from bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(KnxError::buffer_too_small());
        }

        let length = data[0];
        if length != 4 {
            return Err(KnxError::invalid_frame());
        }

        Ok(Self {
            connection_type: data[1],
            knx_layer: data[2],
        })
    }
}

/// `CONNECT_REQUEST` service (0x0205)
#[derive(Debug, Clone, Copy)]
pub struct ConnectRequest {
    /// Control endpoint (for connection management)
    pub control_endpoint: Hpai,
    /// Data endpoint (for tunneling data)
    pub data_endpoint: Hpai,
    /// Connection request information
    pub cri: ConnectionRequestInfo,
}

impl ConnectRequest {
    /// Create a new `CONNECT_REQUEST`
    pub const fn new(control_endpoint: Hpai, data_endpoint: Hpai) -> Self {
        Self {
            control_endpoint,
            data_endpoint,
            cri: ConnectionRequestInfo::tunnel_link_layer(),
        }
    }

    /// Build the complete frame
    ///
    /// Returns the number of bytes written to the buffer
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 26 {
            return Err(KnxError::buffer_too_small());
        }

        let mut offset = 0;

        // Header (6 bytes)
        buf[0] = 0x06; // Header length
        buf[1] = 0x10; // Protocol version 1.0
        buf[2..4].copy_from_slice(&SERVICE_CONNECT_REQUEST.to_be_bytes());
        // Total length will be filled at the end
        offset += 6;

        // Control endpoint (8 bytes)
        offset += self.control_endpoint.encode(&mut buf[offset..])?;

        // Data endpoint (8 bytes)
        offset += self.data_endpoint.encode(&mut buf[offset..])?;

        // CRI (4 bytes)
        offset += self.cri.encode(&mut buf[offset..])?;

        // Fill total length
        buf[4..6].copy_from_slice(&(offset as u16).to_be_bytes());

        Ok(offset)
    }
}

/// `CONNECT_RESPONSE` service (0x0206)
#[derive(Debug, Clone, Copy)]
pub struct ConnectResponse {
    /// Communication channel ID
    pub channel_id: u8,
    /// Status code (0 = OK)
    pub status: u8,
    /// Data endpoint assigned by server
    pub data_endpoint: Hpai,
    /// Connection response data
    pub crd: [u8; 4],
}

impl ConnectResponse {
    /// Parse from frame body
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 14 {
            return Err(KnxError::buffer_too_small());
        }

        let channel_id = data[0];
        let status = data[1];
        let data_endpoint = Hpai::parse(&data[2..10])?;

        let mut crd = [0u8; 4];
        crd.copy_from_slice(&data[10..14]);

        Ok(Self {
            channel_id,
            status,
            data_endpoint,
            crd,
        })
    }

    /// Check if connection was successful
    pub const fn is_ok(&self) -> bool {
        self.status == 0
    }
}

/// `CONNECTIONSTATE_REQUEST` service (0x0207)
#[derive(Debug, Clone, Copy)]
pub struct ConnectionStateRequest {
    /// Communication channel ID
    pub channel_id: u8,
    /// Control endpoint
    pub control_endpoint: Hpai,
}

impl ConnectionStateRequest {
    /// Create a new `CONNECTIONSTATE_REQUEST`
    pub const fn new(channel_id: u8, control_endpoint: Hpai) -> Self {
        Self {
            channel_id,
            control_endpoint,
        }
    }

    /// Build the complete frame
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 16 {
            return Err(KnxError::buffer_too_small());
        }

        let mut offset = 0;

        // Header
        buf[0] = 0x06;
        buf[1] = 0x10;
        buf[2..4].copy_from_slice(&SERVICE_CONNECTIONSTATE_REQUEST.to_be_bytes());
        offset += 6;

        // Channel ID + reserved
        buf[offset] = self.channel_id;
        buf[offset + 1] = 0x00;
        offset += 2;

        // Control endpoint
        offset += self.control_endpoint.encode(&mut buf[offset..])?;

        // Fill total length
        buf[4..6].copy_from_slice(&(offset as u16).to_be_bytes());

        Ok(offset)
    }
}

/// `CONNECTIONSTATE_RESPONSE` service (0x0208)
#[derive(Debug, Clone, Copy)]
pub struct ConnectionStateResponse {
    /// Communication channel ID
    pub channel_id: u8,
    /// Status code (0 = OK)
    pub status: u8,
}

impl ConnectionStateResponse {
    /// Parse from frame body
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }

        Ok(Self {
            channel_id: data[0],
            status: data[1],
        })
    }

    /// Check if connection is still alive
    pub const fn is_ok(&self) -> bool {
        self.status == 0
    }
}

/// `DISCONNECT_REQUEST` service (0x0209)
#[derive(Debug, Clone, Copy)]
pub struct DisconnectRequest {
    /// Communication channel ID
    pub channel_id: u8,
    /// Control endpoint
    pub control_endpoint: Hpai,
}

impl DisconnectRequest {
    /// Create a new `DISCONNECT_REQUEST`
    pub const fn new(channel_id: u8, control_endpoint: Hpai) -> Self {
        Self {
            channel_id,
            control_endpoint,
        }
    }

    /// Build the complete frame
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 16 {
            return Err(KnxError::buffer_too_small());
        }

        let mut offset = 0;

        // Header
        buf[0] = 0x06;
        buf[1] = 0x10;
        buf[2..4].copy_from_slice(&SERVICE_DISCONNECT_REQUEST.to_be_bytes());
        offset += 6;

        // Channel ID + reserved
        buf[offset] = self.channel_id;
        buf[offset + 1] = 0x00;
        offset += 2;

        // Control endpoint
        offset += self.control_endpoint.encode(&mut buf[offset..])?;

        // Fill total length
        buf[4..6].copy_from_slice(&(offset as u16).to_be_bytes());

        Ok(offset)
    }
}

/// `DISCONNECT_RESPONSE` service (0x020A)
#[derive(Debug, Clone, Copy)]
pub struct DisconnectResponse {
    /// Communication channel ID
    pub channel_id: u8,
    /// Status code (0 = OK)
    pub status: u8,
}

impl DisconnectResponse {
    /// Parse from frame body
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }

        Ok(Self {
            channel_id: data[0],
            status: data[1],
        })
    }

    /// Check if disconnect was acknowledged
    pub const fn is_ok(&self) -> bool {
        self.status == 0
    }
}

/// Connection header for tunneling requests
#[derive(Debug, Clone, Copy)]
pub struct ConnectionHeader {
    /// Communication channel ID
    pub channel_id: u8,
    /// Sequence counter
    pub sequence_counter: u8,
}

impl ConnectionHeader {
    /// Create a new connection header
    pub const fn new(channel_id: u8, sequence_counter: u8) -> Self {
        Self {
            channel_id,
            sequence_counter,
        }
    }

    /// Encode to bytes
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 4 {
            return Err(KnxError::buffer_too_small());
        }

        buf[0] = 4; // Structure length
        buf[1] = self.channel_id;
        buf[2] = self.sequence_counter;
        buf[3] = 0x00; // Reserved

        Ok(4)
    }

    /// Decode from bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(KnxError::buffer_too_small());
        }

        Ok(Self {
            channel_id: data[1],
            sequence_counter: data[2],
        })
    }
}

/// `TUNNELING_REQUEST` service (0x0420)
#[derive(Debug)]
pub struct TunnelingRequest<'a> {
    /// Connection header
    pub connection_header: ConnectionHeader,
    /// cEMI frame data
    pub cemi_data: &'a [u8],
}

impl<'a> TunnelingRequest<'a> {
    /// Create a new `TUNNELING_REQUEST`
    pub const fn new(connection_header: ConnectionHeader, cemi_data: &'a [u8]) -> Self {
        Self {
            connection_header,
            cemi_data,
        }
    }

    /// Build the complete frame
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let total_len = 6 + 4 + self.cemi_data.len();
        if buf.len() < total_len {
            return Err(KnxError::buffer_too_small());
        }

        let mut offset = 0;

        // Header
        buf[0] = 0x06;
        buf[1] = 0x10;
        buf[2..4].copy_from_slice(&SERVICE_TUNNELING_REQUEST.to_be_bytes());
        buf[4..6].copy_from_slice(&(total_len as u16).to_be_bytes());
        offset += 6;

        // Connection header
        offset += self.connection_header.encode(&mut buf[offset..])?;

        // cEMI data
        buf[offset..offset + self.cemi_data.len()].copy_from_slice(self.cemi_data);
        offset += self.cemi_data.len();

        Ok(offset)
    }

    /// Parse from frame body
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(KnxError::buffer_too_small());
        }

        let connection_header = ConnectionHeader::decode(&data[0..4])?;
        let cemi_data = &data[4..];

        Ok(Self {
            connection_header,
            cemi_data,
        })
    }
}

/// `TUNNELING_ACK` service (0x0421)
#[derive(Debug, Clone, Copy)]
pub struct TunnelingAck {
    /// Connection header
    pub connection_header: ConnectionHeader,
    /// Status code (0 = OK)
    pub status: u8,
}

impl TunnelingAck {
    /// Create a new `TUNNELING_ACK`
    pub const fn new(connection_header: ConnectionHeader, status: u8) -> Self {
        Self {
            connection_header,
            status,
        }
    }

    /// Build the complete frame
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 11 {
            return Err(KnxError::buffer_too_small());
        }

        let mut offset = 0;

        // Header
        buf[0] = 0x06;
        buf[1] = 0x10;
        buf[2..4].copy_from_slice(&SERVICE_TUNNELING_ACK.to_be_bytes());
        buf[4..6].copy_from_slice(&11u16.to_be_bytes());
        offset += 6;

        // Connection header
        offset += self.connection_header.encode(&mut buf[offset..])?;

        // Status
        buf[offset] = self.status;
        offset += 1;

        Ok(offset)
    }

    /// Parse from frame body
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 5 {
            return Err(KnxError::buffer_too_small());
        }

        let connection_header = ConnectionHeader::decode(&data[0..4])?;
        let status = data[4];

        Ok(Self {
            connection_header,
            status,
        })
    }

    /// Check if request was acknowledged successfully
    pub const fn is_ok(&self) -> bool {
        self.status == 0
    }
}

/// `SEARCH_REQUEST` service (0x0201): legacy gateway discovery, broadcast
/// or sent directly, carrying only the endpoint responses should be sent to.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest {
    pub discovery_endpoint: Hpai,
}

impl SearchRequest {
    pub const fn new(discovery_endpoint: Hpai) -> Self {
        Self { discovery_endpoint }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let total = 6 + 8;
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, ServiceType::SearchRequest, total as u16)?;
        self.discovery_endpoint.encode(&mut buf[6..])?;
        Ok(total)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Self { discovery_endpoint: Hpai::parse(data)? })
    }
}

/// `SEARCH_REQUEST_EXTENDED` service (0x020B): core v2 discovery with
/// optional `Srp` selection/request filters.
#[derive(Debug, Clone)]
pub struct SearchRequestExtended {
    pub discovery_endpoint: Hpai,
    pub srps: Vec<Srp>,
}

impl SearchRequestExtended {
    pub const fn new(discovery_endpoint: Hpai, srps: Vec<Srp>) -> Self {
        Self { discovery_endpoint, srps }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let srp_len: usize = self.srps.iter().map(Srp::len).sum();
        let total = 6 + 8 + srp_len;
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, ServiceType::SearchRequestExtended, total as u16)?;
        let mut offset = 6;
        offset += self.discovery_endpoint.encode(&mut buf[offset..])?;
        for srp in &self.srps {
            offset += srp.encode(&mut buf[offset..])?;
        }
        Ok(offset)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(KnxError::buffer_too_small());
        }
        let discovery_endpoint = Hpai::parse(&data[..8])?;
        let mut rest = &data[8..];
        let mut srps = Vec::new();
        while !rest.is_empty() {
            let (srp, consumed) = Srp::parse(rest)?;
            srps.push(srp);
            rest = &rest[consumed..];
        }
        Ok(Self { discovery_endpoint, srps })
    }
}

/// `SEARCH_RESPONSE` service (0x0202): a gateway's reply to `SEARCH_REQUEST`,
/// its control endpoint plus a list of description blocks.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub control_endpoint: Hpai,
    pub dibs: Vec<Dib>,
}

impl SearchResponse {
    pub const fn new(control_endpoint: Hpai, dibs: Vec<Dib>) -> Self {
        Self { control_endpoint, dibs }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let dib_len: usize = self.dibs.iter().map(Dib::len).sum();
        let total = 6 + 8 + dib_len;
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, ServiceType::SearchResponse, total as u16)?;
        let mut offset = 6;
        offset += self.control_endpoint.encode(&mut buf[offset..])?;
        offset += Dib::encode_all(&self.dibs, &mut buf[offset..])?;
        Ok(offset)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(KnxError::buffer_too_small());
        }
        let control_endpoint = Hpai::parse(&data[..8])?;
        let dibs = Dib::parse_all(&data[8..])?;
        Ok(Self { control_endpoint, dibs })
    }
}

/// `SEARCH_RESPONSE_EXTENDED` service (0x020C): identical wire shape to
/// `SEARCH_RESPONSE`, distinguished only by its service type id (core v2
/// gateways answering `SEARCH_REQUEST_EXTENDED` typically include more DIBs,
/// e.g. `TunnellingInfo`/`SecuredServiceFamilies`).
#[derive(Debug, Clone)]
pub struct SearchResponseExtended {
    pub control_endpoint: Hpai,
    pub dibs: Vec<Dib>,
}

impl SearchResponseExtended {
    pub const fn new(control_endpoint: Hpai, dibs: Vec<Dib>) -> Self {
        Self { control_endpoint, dibs }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let dib_len: usize = self.dibs.iter().map(Dib::len).sum();
        let total = 6 + 8 + dib_len;
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, ServiceType::SearchResponseExtended, total as u16)?;
        let mut offset = 6;
        offset += self.control_endpoint.encode(&mut buf[offset..])?;
        offset += Dib::encode_all(&self.dibs, &mut buf[offset..])?;
        Ok(offset)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(KnxError::buffer_too_small());
        }
        let control_endpoint = Hpai::parse(&data[..8])?;
        let dibs = Dib::parse_all(&data[8..])?;
        Ok(Self { control_endpoint, dibs })
    }
}

/// `DESCRIPTION_REQUEST` service (0x0203): ask a known gateway to describe
/// itself directly, bypassing multicast discovery.
#[derive(Debug, Clone, Copy)]
pub struct DescriptionRequest {
    pub control_endpoint: Hpai,
}

impl DescriptionRequest {
    pub const fn new(control_endpoint: Hpai) -> Self {
        Self { control_endpoint }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let total = 6 + 8;
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, ServiceType::DescriptionRequest, total as u16)?;
        self.control_endpoint.encode(&mut buf[6..])?;
        Ok(total)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Self { control_endpoint: Hpai::parse(data)? })
    }
}

/// `DESCRIPTION_RESPONSE` service (0x0204): a DIB list with no endpoint,
/// since it's answered directly on the connection the request arrived on.
#[derive(Debug, Clone)]
pub struct DescriptionResponse {
    pub dibs: Vec<Dib>,
}

impl DescriptionResponse {
    pub const fn new(dibs: Vec<Dib>) -> Self {
        Self { dibs }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let dib_len: usize = self.dibs.iter().map(Dib::len).sum();
        let total = 6 + dib_len;
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, ServiceType::DescriptionResponse, total as u16)?;
        Dib::encode_all(&self.dibs, &mut buf[6..])?;
        Ok(total)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        Ok(Self { dibs: Dib::parse_all(data)? })
    }
}

/// `ROUTING_INDICATION` service (0x0530): a cEMI frame (typically
/// `L_Data.ind`) multicast on the routing backbone.
#[derive(Debug)]
pub struct RoutingIndication<'a> {
    pub cemi_data: &'a [u8],
}

impl<'a> RoutingIndication<'a> {
    pub const fn new(cemi_data: &'a [u8]) -> Self {
        Self { cemi_data }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let total = 6 + self.cemi_data.len();
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, ServiceType::RoutingIndication, total as u16)?;
        buf[6..total].copy_from_slice(self.cemi_data);
        Ok(total)
    }

    pub fn parse(data: &'a [u8]) -> Result<Self> {
        Ok(Self { cemi_data: data })
    }
}

/// `ROUTING_LOST_MESSAGE` service (0x0531): sent by a router when its
/// receive queue overflows, carrying a count of dropped telegrams.
#[derive(Debug, Clone, Copy)]
pub struct RoutingLostMessage {
    pub device_state: u8,
    pub lost_message_count: u16,
}

impl RoutingLostMessage {
    pub const fn new(device_state: u8, lost_message_count: u16) -> Self {
        Self { device_state, lost_message_count }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let total = 6 + 4;
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, ServiceType::RoutingLostMessage, total as u16)?;
        buf[6] = 4; // structure length
        buf[7] = self.device_state;
        buf[8..10].copy_from_slice(&self.lost_message_count.to_be_bytes());
        Ok(total)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(KnxError::buffer_too_small());
        }
        Ok(Self {
            device_state: data[1],
            lost_message_count: u16::from_be_bytes([data[2], data[3]]),
        })
    }
}

/// `ROUTING_BUSY` service (0x0532): backpressure signal asking senders to
/// back off for `wait_time` milliseconds plus random jitter.
#[derive(Debug, Clone, Copy)]
pub struct RoutingBusy {
    pub device_state: u8,
    pub wait_time_ms: u16,
    pub control_field: u16,
}

impl RoutingBusy {
    pub const fn new(device_state: u8, wait_time_ms: u16, control_field: u16) -> Self {
        Self { device_state, wait_time_ms, control_field }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let total = 6 + 6;
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, ServiceType::RoutingBusy, total as u16)?;
        buf[6] = 6; // structure length
        buf[7] = self.device_state;
        buf[8..10].copy_from_slice(&self.wait_time_ms.to_be_bytes());
        buf[10..12].copy_from_slice(&self.control_field.to_be_bytes());
        Ok(total)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 6 {
            return Err(KnxError::buffer_too_small());
        }
        Ok(Self {
            device_state: data[1],
            wait_time_ms: u16::from_be_bytes([data[2], data[3]]),
            control_field: u16::from_be_bytes([data[4], data[5]]),
        })
    }
}

/// KNX/IP Secure service bodies (`SecureWrapper`/`Session*`, 0x09xx).
///
/// These are frame-codec stubs only: they carry the raw body bytes so a
/// frame containing them round-trips through parse/build without data
/// loss, but no AES-CCM wrapping/unwrapping or key derivation is
/// implemented here (KNX/IP Secure crypto is out of scope).
#[derive(Debug, Clone)]
pub struct SecureBody {
    pub service: ServiceType,
    pub raw: Vec<u8>,
}

impl SecureBody {
    pub const fn new(service: ServiceType, raw: Vec<u8>) -> Self {
        Self { service, raw }
    }

    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let total = 6 + self.raw.len();
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        write_header(buf, self.service, total as u16)?;
        buf[6..total].copy_from_slice(&self.raw);
        Ok(total)
    }

    pub fn parse(service: ServiceType, data: &[u8]) -> Result<Self> {
        Ok(Self { service, raw: data.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hpai_encode_decode() {
        let hpai = Hpai::new([192, 168, 1, 10], 3671);
        let mut buf = [0u8; 8];
        let len = hpai.encode(&mut buf).unwrap();
        assert_eq!(len, 8);

        let decoded = Hpai::parse(&buf).unwrap();
        assert_eq!(decoded, hpai);
    }

    #[test]
    fn test_connect_request_build() {
        let control = Hpai::new([192, 168, 1, 100], 3671);
        let data = Hpai::new([192, 168, 1, 100], 3671);
        let request = ConnectRequest::new(control, data);

        let mut buf = [0u8; 32];
        let len = request.build(&mut buf).unwrap();

        assert_eq!(len, 26);
        assert_eq!(&buf[0..2], &[0x06, 0x10]); // Header
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), SERVICE_CONNECT_REQUEST);
    }

    #[test]
    fn test_connection_header() {
        let header = ConnectionHeader::new(5, 10);
        let mut buf = [0u8; 4];
        let len = header.encode(&mut buf).unwrap();

        assert_eq!(len, 4);

        let decoded = ConnectionHeader::decode(&buf).unwrap();
        assert_eq!(decoded.channel_id, 5);
        assert_eq!(decoded.sequence_counter, 10);
    }

    #[test]
    fn test_tunneling_ack() {
        let header = ConnectionHeader::new(3, 15);
        let ack = TunnelingAck::new(header, 0);

        let mut buf = [0u8; 16];
        let len = ack.build(&mut buf).unwrap();

        assert_eq!(len, 11);
        assert!(ack.is_ok());
    }

    #[test]
    fn search_request_round_trips() {
        let req = SearchRequest::new(Hpai::new([192, 168, 1, 2], 0));
        let mut buf = [0u8; 32];
        let len = req.build(&mut buf).unwrap();
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), ServiceType::SearchRequest.to_u16());

        let parsed = SearchRequest::parse(&buf[6..len]).unwrap();
        assert_eq!(parsed.discovery_endpoint, req.discovery_endpoint);
    }

    #[test]
    fn search_request_extended_with_srps_round_trips() {
        let req = SearchRequestExtended::new(
            Hpai::new([0, 0, 0, 0], 0),
            vec![crate::protocol::srp::Srp::ProgrammingMode],
        );
        let mut buf = [0u8; 32];
        let len = req.build(&mut buf).unwrap();
        let parsed = SearchRequestExtended::parse(&buf[6..len]).unwrap();
        assert_eq!(parsed.srps, req.srps);
    }

    #[test]
    fn search_response_round_trips_with_dibs() {
        let dibs = vec![crate::protocol::dib::Dib::Other { dib_type: 0xFE, data: vec![1, 2, 3] }];
        let resp = SearchResponse::new(Hpai::new([10, 0, 0, 1], 3671), dibs.clone());
        let mut buf = [0u8; 64];
        let len = resp.build(&mut buf).unwrap();
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), ServiceType::SearchResponse.to_u16());

        let parsed = SearchResponse::parse(&buf[6..len]).unwrap();
        assert_eq!(parsed.dibs, dibs);
    }

    #[test]
    fn search_response_extended_uses_distinct_service_id() {
        let resp = SearchResponseExtended::new(Hpai::new([10, 0, 0, 1], 3671), vec![]);
        let mut buf = [0u8; 32];
        resp.build(&mut buf).unwrap();
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), ServiceType::SearchResponseExtended.to_u16());
    }

    #[test]
    fn description_request_response_round_trip() {
        let req = DescriptionRequest::new(Hpai::new([192, 168, 1, 2], 0));
        let mut buf = [0u8; 32];
        let len = req.build(&mut buf).unwrap();
        let parsed = DescriptionRequest::parse(&buf[6..len]).unwrap();
        assert_eq!(parsed.control_endpoint, req.control_endpoint);

        let dibs = vec![crate::protocol::dib::Dib::Other { dib_type: 0xFE, data: vec![9] }];
        let resp = DescriptionResponse::new(dibs.clone());
        let mut rbuf = [0u8; 32];
        let rlen = resp.build(&mut rbuf).unwrap();
        let parsed_resp = DescriptionResponse::parse(&rbuf[6..rlen]).unwrap();
        assert_eq!(parsed_resp.dibs, dibs);
    }

    #[test]
    fn routing_indication_carries_cemi_payload() {
        let cemi = [0x29, 0x00, 0xBC, 0xE0, 0x11, 0x01, 0x09, 0x2d, 0x01, 0x00];
        let ind = RoutingIndication::new(&cemi);
        let mut buf = [0u8; 32];
        let len = ind.build(&mut buf).unwrap();
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), ServiceType::RoutingIndication.to_u16());
        assert_eq!(&buf[6..len], &cemi);
    }

    #[test]
    fn routing_lost_message_round_trips() {
        let msg = RoutingLostMessage::new(0, 7);
        let mut buf = [0u8; 16];
        let len = msg.build(&mut buf).unwrap();
        let parsed = RoutingLostMessage::parse(&buf[6..len]).unwrap();
        assert_eq!(parsed.lost_message_count, 7);
    }

    #[test]
    fn routing_busy_round_trips() {
        let busy = RoutingBusy::new(0, 100, 0);
        let mut buf = [0u8; 16];
        let len = busy.build(&mut buf).unwrap();
        let parsed = RoutingBusy::parse(&buf[6..len]).unwrap();
        assert_eq!(parsed.wait_time_ms, 100);
    }

    #[test]
    fn secure_body_preserves_raw_bytes() {
        let body = SecureBody::new(ServiceType::SessionRequest, vec![1, 2, 3, 4]);
        let mut buf = [0u8; 16];
        let len = body.build(&mut buf).unwrap();
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), ServiceType::SessionRequest.to_u16());

        let parsed = SecureBody::parse(ServiceType::SessionRequest, &buf[6..len]).unwrap();
        assert_eq!(parsed.raw, vec![1, 2, 3, 4]);
    }
}
