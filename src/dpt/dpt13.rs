//! DPT 13.xxx - 4-byte Signed Value (4 bytes)
//!
//! 32-bit signed datapoint types represent values from -2,147,483,648 to +2,147,483,647.
//!
//! ## Format
//!
//! - 32 bits: signed value (-2^31 to 2^31-1), big-endian, two's complement
//!
//! ## Common Subtypes
//!
//! - **13.001** - Counter Pulses (signed)
//! - **13.002** - Flow Rate (l/h)
//! - **13.010** - Active Energy (Wh)
//! - **13.011** - Apparent Energy (VAh)
//! - **13.012** - Reactive Energy (VArh)
//! - **13.013** - Active Energy (kWh)
//! - **13.014** - Apparent Energy (kVAh)
//! - **13.015** - Reactive Energy (kVArh)
//! - **13.100** - Long Delta Time Period (s)
//!
//! ## Example
//!
//! ```rust,no_run
//! use knx::dpt::{Dpt13, DptDecode};
//!
//! // Decode active energy in Wh
//! let wh = Dpt13::ActiveEnergy.decode(&[0x00, 0x07, 0xA1, 0x20])?;  // 500000 Wh
//!
//! // Encode flow rate (can be negative for reverse flow)
//! let data = Dpt13::FlowRate.encode_to_bytes(-1000)?;  // Reverse flow
//!
//! // Counter pulses (signed, can increment/decrement)
//! let pulses = Dpt13::Counter.decode(&[0xFF, 0xFF, 0xFF, 0xFF])?;  // -1
//! ```

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 13.xxx 32-bit signed types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dpt13 {
    /// DPT 13.001 - Counter Pulses (signed)
    Counter,
    /// DPT 13.002 - Flow Rate (l/h)
    FlowRate,
    /// DPT 13.010 - Active Energy (Wh)
    ActiveEnergy,
    /// DPT 13.011 - Apparent Energy (VAh)
    ApparentEnergy,
    /// DPT 13.012 - Reactive Energy (VArh)
    ReactiveEnergy,
    /// DPT 13.013 - Active Energy (kWh)
    ActiveEnergyKwh,
    /// DPT 13.014 - Apparent Energy (kVAh)
    ApparentEnergyKvah,
    /// DPT 13.015 - Reactive Energy (kVArh)
    ReactiveEnergyKvarh,
    /// DPT 13.100 - Long Delta Time Period (s)
    LongDeltaTimeSec,
}

impl Dpt13 {
    /// Get the DPT identifier string (e.g., "13.001")
    #[inline]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Dpt13::Counter => "13.001",
            Dpt13::FlowRate => "13.002",
            Dpt13::ActiveEnergy => "13.010",
            Dpt13::ApparentEnergy => "13.011",
            Dpt13::ReactiveEnergy => "13.012",
            Dpt13::ActiveEnergyKwh => "13.013",
            Dpt13::ApparentEnergyKvah => "13.014",
            Dpt13::ReactiveEnergyKvarh => "13.015",
            Dpt13::LongDeltaTimeSec => "13.100",
        }
    }

    /// Get the unit string for this DPT
    #[inline]
    pub const fn unit(&self) -> &'static str {
        match self {
            Dpt13::Counter => "pulses",
            Dpt13::FlowRate => "l/h",
            Dpt13::ActiveEnergy => "Wh",
            Dpt13::ApparentEnergy => "VAh",
            Dpt13::ReactiveEnergy => "VArh",
            Dpt13::ActiveEnergyKwh => "kWh",
            Dpt13::ApparentEnergyKvah => "kVAh",
            Dpt13::ReactiveEnergyKvarh => "kVArh",
            Dpt13::LongDeltaTimeSec => "s",
        }
    }

    /// Get the valid range for this DPT (min, max)
    #[inline]
    pub const fn range(&self) -> (i32, i32) {
        // All DPT 13.xxx types use full i32 range
        (i32::MIN, i32::MAX)
    }

    /// Encode an i32 value to 4 bytes (big-endian)
    ///
    /// # Performance
    /// - Uses optimized big-endian conversion
    /// - Inlined for zero-cost abstraction
    /// - No heap allocations
    ///
    /// # Arguments
    /// * `value` - The value to encode (-2^31 to 2^31-1)
    ///
    /// # Returns
    /// 4-byte array in big-endian format (two's complement for negatives)
    ///
    /// # Example
    /// ```rust,no_run
    /// // Positive value
    /// let bytes = Dpt13::ActiveEnergy.encode_to_bytes(500000)?;
    /// assert_eq!(bytes, [0x00, 0x07, 0xA1, 0x20]);
    ///
    /// // Negative value
    /// let bytes = Dpt13::FlowRate.encode_to_bytes(-1000)?;
    /// assert_eq!(bytes, [0xFF, 0xFF, 0xFC, 0x18]);
    /// ```
    #[inline]
    pub fn encode_to_bytes(&self, value: i32) -> Result<[u8; 4]> {
        // All i32 values are valid for DPT 13.xxx
        // to_be_bytes() handles two's complement encoding automatically
        Ok(value.to_be_bytes())
    }

    /// Decode 4 bytes (big-endian) to i32 value
    ///
    /// # Arguments
    /// * `data` - 4-byte slice in big-endian format (two's complement)
    ///
    /// # Returns
    /// The decoded i32 value
    ///
    /// # Errors
    /// Returns an error if data length is less than 4 bytes
    #[inline]
    fn decode_raw(&self, data: &[u8]) -> Result<i32> {
        if data.len() < 4 {
            return Err(KnxError::invalid_dpt_data());
        }

        let bytes = [data[0], data[1], data[2], data[3]];
        Ok(i32::from_be_bytes(bytes))
    }
}

impl DptDecode<i32> for Dpt13 {
    #[inline]
    fn decode(&self, data: &[u8]) -> Result<i32> {
        self.decode_raw(data)
    }
}

impl DptEncode<i32> for Dpt13 {
    #[inline]
    fn encode(&self, value: i32, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 4 {
            return Err(KnxError::buffer_too_small());
        }
        buf[0..4].copy_from_slice(&value.to_be_bytes());
        Ok(4)
    }
}
