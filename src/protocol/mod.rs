//! KNXnet/IP protocol implementation.
//!
//! This module contains the core protocol structures and parsing logic
//! for KNXnet/IP frames, cEMI messages, and KNX telegrams.

pub mod async_tunnel;
pub mod cemi;
pub mod constants;
pub mod dib;
pub mod frame;
pub mod services;
pub mod srp;
pub mod tunnel;

pub use cemi::*;
pub use constants::*;
pub use frame::*;
pub use services::*;
