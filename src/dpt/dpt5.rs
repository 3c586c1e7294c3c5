//! DPT 5.xxx - 8-bit Unsigned Value (1 byte)
//!
//! 8-bit unsigned datapoint types represent values from 0 to 255
//! with different scaling and interpretations.
//!
//! ## Format
//!
//! - 8 bits: unsigned value (0-255)
//!
//! ## Common Subtypes
//!
//! - **5.001** - Percentage (0-100%)
//! - **5.003** - Angle (0-360°)
//! - **5.004** - Percentage 0-255 (0-255)
//! - **5.005** - Ratio (0-255)
//! - **5.006** - Tariff (0-254)
//! - **5.010** - Counter pulses (0-255)
//!
//! Scaled subtypes (`Percentage`, `Angle`) use the same rounding linear
//! scale as the rest of the DPT 5 family: `raw = round((v - lo) * 255 /
//! (hi - lo))` and back, see [`crate::dpt::scaling`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx::dpt::{Dpt5, DptEncode, DptDecode};
//!
//! let mut buf = [0u8; 1];
//! let len = Dpt5::Percentage.encode(75, &mut buf)?;
//! let value = Dpt5::Percentage.decode(&buf[..len])?;
//! # Ok::<(), knx::KnxError>(())
//! ```

use crate::dpt::scaling;
use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 5.xxx 8-bit unsigned types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dpt5 {
    /// DPT 5.001 - Percentage (0-100%)
    Percentage,
    /// DPT 5.003 - Angle (0-360°)
    Angle,
    /// DPT 5.004 - Percentage 0-255 (0-255)
    PercentU8,
    /// DPT 5.005 - Ratio (0-255)
    Ratio,
    /// DPT 5.006 - Tariff (0-254)
    Tariff,
    /// DPT 5.010 - Counter pulses (0-255)
    Counter,
}

impl Dpt5 {
    /// Get the DPT identifier string (e.g., "5.001")
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt5::Percentage => "5.001",
            Dpt5::Angle => "5.003",
            Dpt5::PercentU8 => "5.004",
            Dpt5::Ratio => "5.005",
            Dpt5::Tariff => "5.006",
            Dpt5::Counter => "5.010",
        }
    }

    /// Get the unit string for this DPT
    pub const fn unit(&self) -> &'static str {
        match self {
            Dpt5::Percentage => "%",
            Dpt5::Angle => "°",
            Dpt5::PercentU8 => "",
            Dpt5::Ratio => "",
            Dpt5::Tariff => "",
            Dpt5::Counter => "pulses",
        }
    }

    /// Get the valid range for this DPT (min, max)
    pub const fn range(&self) -> (u16, u16) {
        match self {
            Dpt5::Percentage => (0, 100),
            Dpt5::Angle => (0, 360),
            Dpt5::PercentU8 => (0, 255),
            Dpt5::Ratio => (0, 255),
            Dpt5::Tariff => (0, 254),
            Dpt5::Counter => (0, 255),
        }
    }

    fn is_scaled(&self) -> bool {
        matches!(self, Dpt5::Percentage | Dpt5::Angle)
    }

    /// Encode a value to raw byte.
    ///
    /// For scaled types (Percentage, Angle) this applies the rounding
    /// linear scale; the remaining subtypes map the value directly.
    #[inline]
    fn encode_scaled(&self, value: u16) -> Result<u8> {
        let (min, max) = self.range();

        if value > max {
            return Err(KnxError::dpt_value_out_of_range());
        }

        if self.is_scaled() {
            return Ok(scaling::to_knx(i32::from(value), 0, i32::from(max)));
        }

        if value < min {
            return Err(KnxError::dpt_value_out_of_range());
        }
        Ok(value as u8)
    }

    /// Decode raw byte to value.
    ///
    /// For scaled types (Percentage, Angle) this applies the inverse
    /// rounding linear scale.
    #[inline]
    fn decode_scaled(&self, raw: u8) -> Result<u16> {
        if self.is_scaled() {
            let (_, max) = self.range();
            return Ok(scaling::from_knx(raw, 0, i32::from(max)) as u16);
        }

        if matches!(self, Dpt5::Tariff) && raw > 254 {
            return Err(KnxError::dpt_value_out_of_range());
        }

        Ok(u16::from(raw))
    }
}

impl DptEncode<u16> for Dpt5 {
    fn encode(&self, value: u16, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = self.encode_scaled(value)?;
        Ok(1)
    }
}

impl DptDecode<u16> for Dpt5 {
    fn decode(&self, data: &[u8]) -> Result<u16> {
        if data.is_empty() {
            return Err(KnxError::invalid_dpt_data());
        }

        self.decode_scaled(data[0])
    }
}

impl Dpt5 {
    /// Encode a value to a byte directly, without going through a buffer.
    pub fn encode_to_byte(&self, value: u16) -> Result<u8> {
        self.encode_scaled(value)
    }
}
