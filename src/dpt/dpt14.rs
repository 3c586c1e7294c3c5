//! DPT 14.xxx - 4-byte Float (IEEE 754 single precision)
//!
//! Unlike DPT 9's custom 16-bit float, DPT 14 carries a standard IEEE 754
//! `f32` big-endian, giving it much wider range and resolution at the cost
//! of twice the wire size.
//!
//! ## Common Subtypes
//!
//! - **14.056** - Power (W)
//! - **14.057** - Power factor
//! - **14.068** - Temperature (°C)
//! - **14.076** - Volume flow (m³/h)

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 14.xxx 4-byte IEEE 754 float types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dpt14 {
    /// DPT 14.056 - Power (W)
    Power,
    /// DPT 14.057 - Power factor
    PowerFactor,
    /// DPT 14.068 - Temperature (°C)
    Temperature,
    /// DPT 14.076 - Volume flow (m³/h)
    VolumeFlow,
}

impl Dpt14 {
    /// Get the DPT identifier string
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Power => "14.056",
            Self::PowerFactor => "14.057",
            Self::Temperature => "14.068",
            Self::VolumeFlow => "14.076",
        }
    }

    /// Get the unit string
    pub const fn unit(&self) -> &'static str {
        match self {
            Self::Power => "W",
            Self::PowerFactor => "",
            Self::Temperature => "°C",
            Self::VolumeFlow => "m³/h",
        }
    }
}

impl DptEncode<f32> for Dpt14 {
    fn encode(&self, value: f32, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 4 {
            return Err(KnxError::buffer_too_small());
        }
        buf[..4].copy_from_slice(&value.to_be_bytes());
        Ok(4)
    }
}

impl DptDecode<f32> for Dpt14 {
    fn decode(&self, data: &[u8]) -> Result<f32> {
        if data.len() < 4 {
            return Err(KnxError::invalid_dpt_data());
        }
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&data[..4]);
        Ok(f32::from_be_bytes(bytes))
    }
}
