#![allow(dead_code)]
#![doc = include_str!("../README.md")]

//! # knx
//!
//! A host-side (std, tokio) implementation of the KNXnet/IP building-automation
//! protocol: gateway discovery, UDP/TCP tunnelling, multicast routing, and
//! USB-HID transport, built on the same address model and Datapoint Type
//! codecs used throughout the rest of the crate.
//!
//! ## Features
//!
//! - KNXnet/IP tunnelling (UDP and TCP) with heartbeat and reconnect
//! - Multicast routing
//! - USB-HID transport with KNX USB Transfer Protocol framing
//! - Common Datapoint Types (DPT)
//! - Individual and Group addressing, with glob-style address filters
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx::net::UdpTransport;
//! use knx::protocol::async_tunnel::AsyncTunnelClient;
//!
//! # async fn run() -> knx::Result<()> {
//! let transport = UdpTransport::bind(0).await?;
//! let mut tunnel = AsyncTunnelClient::new(transport, [192, 168, 1, 10], 3671);
//! tunnel.connect().await?;
//! # Ok(())
//! # }
//! ```

pub mod addressing;
pub mod config;
pub mod dpt;
pub mod error;
pub mod connection_manager;
pub mod net;
pub mod orchestrator;
pub mod protocol;
pub mod queue;
pub mod request_response;
pub mod router;
pub mod scanner;
pub mod state_updater;
pub mod telegram;

// Macro module (must be declared before use)
#[macro_use]
pub mod macros;

// Re-export commonly used types
pub use addressing::{AddressFilter, AddressStyle, GroupAddress, IndividualAddress};
pub use dpt::{Dpt1, Dpt3, Dpt5, Dpt7, Dpt9, Dpt13, DptDecode, DptEncode};
pub use error::{KnxError, Result};
