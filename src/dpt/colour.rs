//! DPT 232.600 / 251.600 - RGB and RGBW Colour
//!
//! DPT 232.600 packs three colour channels into 3 octets with no validity
//! mask. DPT 251.600 (RGBW) adds a fourth white channel plus a 4-bit
//! validity mask (one bit per channel, R/G/B/W) in the final octet so a
//! sender can update a subset of channels at a time.

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// An RGB colour value, one byte per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// An RGBW colour value with a per-channel validity mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgbw {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
    pub red_valid: bool,
    pub green_valid: bool,
    pub blue_valid: bool,
    pub white_valid: bool,
}

/// DPT 232.600 - RGB colour (3 octets)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dpt232;

impl Dpt232 {
    pub const LEN: usize = 3;

    pub const fn identifier(&self) -> &'static str {
        "232.600"
    }

    pub const fn unit(&self) -> &'static str {
        "RGB"
    }
}

impl DptEncode<Rgb> for Dpt232 {
    fn encode(&self, value: Rgb, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::LEN {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = value.red;
        buf[1] = value.green;
        buf[2] = value.blue;
        Ok(Self::LEN)
    }
}

impl DptDecode<Rgb> for Dpt232 {
    fn decode(&self, data: &[u8]) -> Result<Rgb> {
        if data.len() < Self::LEN {
            return Err(KnxError::invalid_dpt_data());
        }
        Ok(Rgb {
            red: data[0],
            green: data[1],
            blue: data[2],
        })
    }
}

/// DPT 251.600 - RGBW colour with validity mask (6 octets)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dpt251;

impl Dpt251 {
    pub const LEN: usize = 6;

    pub const fn identifier(&self) -> &'static str {
        "251.600"
    }

    pub const fn unit(&self) -> &'static str {
        "RGBW"
    }
}

impl DptEncode<Rgbw> for Dpt251 {
    fn encode(&self, value: Rgbw, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::LEN {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = value.red;
        buf[1] = value.green;
        buf[2] = value.blue;
        buf[3] = value.white;
        buf[4] = 0;
        buf[5] = (u8::from(value.red_valid) << 3)
            | (u8::from(value.green_valid) << 2)
            | (u8::from(value.blue_valid) << 1)
            | u8::from(value.white_valid);
        Ok(Self::LEN)
    }
}

impl DptDecode<Rgbw> for Dpt251 {
    fn decode(&self, data: &[u8]) -> Result<Rgbw> {
        if data.len() < Self::LEN {
            return Err(KnxError::invalid_dpt_data());
        }
        let mask = data[5];
        Ok(Rgbw {
            red: data[0],
            green: data[1],
            blue: data[2],
            white: data[3],
            red_valid: mask & 0x08 != 0,
            green_valid: mask & 0x04 != 0,
            blue_valid: mask & 0x02 != 0,
            white_valid: mask & 0x01 != 0,
        })
    }
}
