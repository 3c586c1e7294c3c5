//! Network transport abstractions for KNXnet/IP.
//!
//! The protocol layer is transport-agnostic: `AsyncTransport` abstracts over
//! the concrete carrier (UDP for tunnelling/routing, TCP for core-v2
//! tunnelling, USB-HID for KNX USB interfaces), so `tunnel`/`scanner` code
//! can be exercised against [`mock_transport::MockTransport`] in tests and
//! against [`udp::UdpTransport`] / [`tcp::TCPTransport`] (or, with the `usb`
//! feature, a USB-HID transport) in production.

pub mod mock_transport;
pub mod tcp;
pub mod transport;
pub mod udp;

#[cfg(feature = "usb")]
pub mod usb;

pub use tcp::TCPTransport;
pub use transport::AsyncTransport;
pub use udp::UdpTransport;
