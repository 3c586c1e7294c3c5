//! Multicast routing (KNXnet/IP `ROUTING_INDICATION`).
//!
//! Joins the routing multicast group, turns outgoing [`Telegram`]s into
//! `ROUTING_INDICATION` datagrams carrying the router's own individual
//! address as cEMI source, and folds inbound datagrams back into
//! `Telegram`s for the queue. Honours `ROUTING_BUSY` backoff and counts
//! `ROUTING_LOST_MESSAGE` as an observable metric.

use crate::addressing::IndividualAddress;
use crate::error::Result;
use crate::net::transport::AsyncTransport;
use crate::net::udp::UdpTransport;
use crate::protocol::constants::{CEMIMessageCode, ServiceType};
use crate::protocol::frame::KnxnetIpFrame;
use crate::protocol::services::{RoutingBusy, RoutingIndication, RoutingLostMessage};
use crate::telegram::{Direction, Telegram};
use rand::Rng;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracing::{info, warn};

/// Default KNXnet/IP routing multicast group.
pub const DEFAULT_ROUTING_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 23, 12);
/// Default KNXnet/IP routing port.
pub const DEFAULT_ROUTING_PORT: u16 = 3671;

/// Multicast time-to-live for outgoing routing datagrams (stays on the
/// local segment per the KNX routing specification's "do not route" advice).
const ROUTING_TTL: u32 = 16;

/// Upper bound of the random jitter added on top of a `ROUTING_BUSY` wait,
/// to avoid every sender resuming in lockstep.
const BUSY_JITTER_MAX_MS: u64 = 50;

const MAX_CEMI_SIZE: usize = 64;
const MAX_FRAME_SIZE: usize = 128;
const MAX_DATAGRAM_SIZE: usize = 512;

/// Sends and receives `ROUTING_INDICATION`/`ROUTING_BUSY`/`ROUTING_LOST_MESSAGE`
/// datagrams over a multicast-joined transport.
pub struct MulticastRouter<T: AsyncTransport = UdpTransport> {
    transport: T,
    group: SocketAddr,
    own_address: IndividualAddress,
    lost_message_count: u64,
}

impl MulticastRouter<UdpTransport> {
    /// Bind a UDP socket on `port`, join `group`, and start routing as
    /// `own_address`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound or cannot join the
    /// multicast group.
    pub async fn bind(own_address: IndividualAddress, group: Ipv4Addr, port: u16) -> Result<Self> {
        let transport = UdpTransport::bind(port).await?;
        transport.join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)?;
        transport.set_multicast_ttl_v4(ROUTING_TTL)?;
        Ok(Self::with_transport(transport, SocketAddr::from((group, port)), own_address))
    }
}

impl<T: AsyncTransport> MulticastRouter<T> {
    /// Build a router directly over an already-prepared transport (a real
    /// multicast-joined `UdpTransport`, or a `MockTransport` in tests).
    pub fn with_transport(transport: T, group: SocketAddr, own_address: IndividualAddress) -> Self {
        Self { transport, group, own_address, lost_message_count: 0 }
    }

    /// Total `ROUTING_LOST_MESSAGE` count observed since this router started.
    pub fn lost_message_count(&self) -> u64 {
        self.lost_message_count
    }

    /// Send `telegram` as a `ROUTING_INDICATION`, with this router's own
    /// individual address as cEMI source.
    ///
    /// # Errors
    ///
    /// Returns an error if the telegram cannot be encoded (non-group
    /// destination) or the send fails.
    pub async fn send(&mut self, telegram: &Telegram) -> Result<()> {
        let mut cemi_buf = [0u8; MAX_CEMI_SIZE];
        let cemi_len = telegram.to_cemi(CEMIMessageCode::LDataInd, &mut cemi_buf)?;

        let indication = RoutingIndication::new(&cemi_buf[..cemi_len]);
        let mut frame_buf = [0u8; MAX_FRAME_SIZE];
        let frame_len = indication.build(&mut frame_buf)?;

        self.transport.send_to(&frame_buf[..frame_len], self.group).await?;
        Ok(())
    }

    /// Receive and classify the next multicast datagram.
    ///
    /// Returns `Ok(Some(telegram))` for an inbound `ROUTING_INDICATION` not
    /// originated by this router itself (multicast loopback). Returns
    /// `Ok(None)` for datagrams handled internally: our own looped-back
    /// indication, a `ROUTING_BUSY` backoff (awaited before returning), a
    /// `ROUTING_LOST_MESSAGE` tally update, or an uninteresting service type.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport read fails or a recognised service
    /// body is malformed.
    pub async fn recv(&mut self) -> Result<Option<Telegram>> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (n, _from) = self.transport.recv_from(&mut buf).await?;
        let frame = KnxnetIpFrame::parse(&buf[..n])?;

        match frame.service_type() {
            ServiceType::RoutingIndication => {
                let indication = RoutingIndication::parse(frame.body())?;
                let telegram = Telegram::from_cemi(indication.cemi_data, Direction::Incoming)?;
                if telegram.source == self.own_address {
                    return Ok(None);
                }
                Ok(Some(telegram))
            }
            ServiceType::RoutingBusy => {
                let busy = RoutingBusy::parse(frame.body())?;
                let jitter = rand::thread_rng().gen_range(0..=BUSY_JITTER_MAX_MS);
                let wait = Duration::from_millis(u64::from(busy.wait_time_ms) + jitter);
                warn!(wait_ms = wait.as_millis(), "ROUTING_BUSY received, backing off");
                tokio::time::sleep(wait).await;
                Ok(None)
            }
            ServiceType::RoutingLostMessage => {
                let lost = RoutingLostMessage::parse(frame.body())?;
                self.lost_message_count += u64::from(lost.lost_message_count);
                info!(total_lost = self.lost_message_count, "ROUTING_LOST_MESSAGE observed");
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}
