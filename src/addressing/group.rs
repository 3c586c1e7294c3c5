//! KNX Group Address implementation.
//!
//! Group addresses represent logical groupings of devices for functional
//! control. Three textual forms are supported:
//! - 3-level: Main/Middle/Sub (e.g., 1/2/3) - most common
//! - 2-level: Main/Sub (e.g., 1/234)
//! - free (flat): a single `0..65535` decimal number
//!
//! Internally always stored as 16 bits:
//! - Main: 5 bits (0-31)
//! - Middle: 3 bits (0-7)
//! - Sub: 8 bits (0-255)

use crate::error::{KnxError, Result};
use std::fmt;

/// Which textual form [`GroupAddress::to_string`] and [`GroupAddress::from_str`]
/// use. A library instance picks one style at startup (see the design notes on
/// "address parsing style is process-wide but immutable").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressStyle {
    /// Main/Middle/Sub, e.g. `1/2/3`.
    #[default]
    Level3,
    /// Main/Sub, e.g. `1/234`.
    Level2,
    /// Flat decimal, e.g. `2563`.
    Free,
}

/// KNX Group Address.
///
/// Used for logical grouping of devices and functions.
///
/// # Examples
///
/// ```
/// use knx::GroupAddress;
///
/// let addr = GroupAddress::new(1, 2, 3).unwrap();
/// assert_eq!(addr.to_string(), "1/2/3");
///
/// let addr = GroupAddress::new_2level(1, 234).unwrap();
/// assert_eq!(addr.to_string_2level(), "1/234");
///
/// let addr = GroupAddress::from(0x0A03u16);
/// assert_eq!(addr.main(), 1);
/// assert_eq!(addr.middle(), 2);
/// assert_eq!(addr.sub(), 3);
///
/// let addr: GroupAddress = "1/2/3".parse().unwrap();
/// assert_eq!(u16::from(addr), 0x0A03);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    /// Maximum main group value (5 bits)
    pub const MAX_MAIN: u8 = 31;
    /// Maximum middle group value (3 bits)
    pub const MAX_MIDDLE: u8 = 7;
    /// Maximum sub group value (8 bits)
    pub const MAX_SUB: u8 = 255;
    /// Maximum sub value for 2-level format (11 bits)
    pub const MAX_SUB_2LEVEL: u16 = 2047;

    /// Create a new 3-level Group Address (Main/Middle/Sub).
    ///
    /// # Errors
    ///
    /// Returns an error if any component is out of range, or if the
    /// resulting address is `0` (group address `0` is reserved/invalid).
    pub fn new(main: u8, middle: u8, sub: u8) -> Result<Self> {
        if main > Self::MAX_MAIN || middle > Self::MAX_MIDDLE {
            return Err(KnxError::address_out_of_range());
        }
        let raw = (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub);
        Self::from_raw_checked(raw)
    }

    /// Create a new 2-level Group Address (Main/Sub).
    ///
    /// # Errors
    ///
    /// Returns an error if any component is out of range.
    pub fn new_2level(main: u8, sub: u16) -> Result<Self> {
        if main > Self::MAX_MAIN || sub > Self::MAX_SUB_2LEVEL {
            return Err(KnxError::address_out_of_range());
        }
        let raw = (u16::from(main) << 11) | sub;
        Self::from_raw_checked(raw)
    }

    /// Create a flat (free-form) Group Address from a raw 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is `0`.
    pub fn new_free(raw: u16) -> Result<Self> {
        Self::from_raw_checked(raw)
    }

    fn from_raw_checked(raw: u16) -> Result<Self> {
        if raw == 0 {
            return Err(KnxError::invalid_group_address());
        }
        Ok(Self { raw })
    }

    /// Create from a 3-element array `[main, middle, sub]`.
    pub fn from_array(parts: [u8; 3]) -> Result<Self> {
        Self::new(parts[0], parts[1], parts[2])
    }

    /// Get the raw u16 representation of the address.
    #[inline(always)]
    pub const fn to_raw(self) -> u16 {
        self.raw
    }

    /// Get the main group component (0-31).
    #[inline(always)]
    pub const fn main(self) -> u8 {
        ((self.raw >> 11) & 0x1F) as u8
    }

    /// Get the middle group component for 3-level format (0-7).
    #[inline(always)]
    pub const fn middle(self) -> u8 {
        ((self.raw >> 8) & 0x07) as u8
    }

    /// Get the sub group component for 3-level format (0-255).
    #[inline(always)]
    pub const fn sub(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Get the sub group component for 2-level format (0-2047).
    #[inline(always)]
    pub const fn sub_2level(self) -> u16 {
        self.raw & 0x07FF
    }

    /// Format as 3-level string (Main/Middle/Sub).
    pub fn to_string_3level(&self) -> String {
        format!("{}/{}/{}", self.main(), self.middle(), self.sub())
    }

    /// Format as 2-level string (Main/Sub).
    pub fn to_string_2level(&self) -> String {
        format!("{}/{}", self.main(), self.sub_2level())
    }

    /// Format as a flat decimal string.
    pub fn to_string_free(&self) -> String {
        self.raw.to_string()
    }

    /// Format according to an explicit [`AddressStyle`], rather than the
    /// `Display` impl's default (3-level).
    pub fn to_string_styled(&self, style: AddressStyle) -> String {
        match style {
            AddressStyle::Level3 => self.to_string_3level(),
            AddressStyle::Level2 => self.to_string_2level(),
            AddressStyle::Free => self.to_string_free(),
        }
    }

    /// Parse a group address using an explicit [`AddressStyle`].
    ///
    /// Unlike [`FromStr`](core::str::FromStr), which auto-detects the form,
    /// this rejects input not shaped like the requested style.
    pub fn parse_styled(s: &str, style: AddressStyle) -> Result<Self> {
        match style {
            AddressStyle::Level3 => {
                let mut parts = s.split('/');
                let main = next_u8(&mut parts)?;
                let middle = next_u8(&mut parts)?;
                let sub = next_u8(&mut parts)?;
                ensure_exhausted(&mut parts)?;
                Self::new(main, middle, sub)
            }
            AddressStyle::Level2 => {
                let mut parts = s.split('/');
                let main = next_u8(&mut parts)?;
                let sub = next_u16(&mut parts)?;
                ensure_exhausted(&mut parts)?;
                Self::new_2level(main, sub)
            }
            AddressStyle::Free => {
                let raw: u16 = s.parse().map_err(|_| KnxError::invalid_group_address())?;
                Self::new_free(raw)
            }
        }
    }

    /// Encode the address into a byte buffer (big-endian).
    ///
    /// # Errors
    ///
    /// Returns an error if `buf` is smaller than 2 bytes.
    #[inline]
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }
        buf[0..2].copy_from_slice(&self.raw.to_be_bytes());
        Ok(2)
    }

    /// Decode an address from a byte buffer (big-endian).
    ///
    /// # Errors
    ///
    /// Returns an error if `buf` is smaller than 2 bytes.
    #[inline]
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }
        let raw = u16::from_be_bytes([buf[0], buf[1]]);
        Ok(Self { raw })
    }
}

fn next_u8<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<u8> {
    parts
        .next()
        .and_then(|s| s.parse::<u8>().ok())
        .ok_or_else(KnxError::invalid_group_address)
}

fn next_u16<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<u16> {
    parts
        .next()
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(KnxError::invalid_group_address)
}

fn ensure_exhausted<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<()> {
    if parts.next().is_some() {
        return Err(KnxError::invalid_group_address());
    }
    Ok(())
}

impl From<u16> for GroupAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<GroupAddress> for u16 {
    #[inline(always)]
    fn from(addr: GroupAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for GroupAddress {
    /// Format as 3-level address by default.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

impl std::str::FromStr for GroupAddress {
    type Err = KnxError;

    /// Auto-detects the textual form: a bare number is `Free`, one slash is
    /// `Level2`, two slashes is `Level3`.
    fn from_str(s: &str) -> Result<Self> {
        match s.matches('/').count() {
            0 => Self::parse_styled(s, AddressStyle::Free),
            1 => Self::parse_styled(s, AddressStyle::Level2),
            2 => Self::parse_styled(s, AddressStyle::Level3),
            _ => Err(KnxError::invalid_group_address()),
        }
    }
}
