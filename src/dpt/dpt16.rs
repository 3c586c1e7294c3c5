//! DPT 16.xxx - 14-octet Character String
//!
//! Fixed 14-byte field, NUL-padded, encoded as either ASCII (16.000) or
//! ISO 8859-1 / Latin-1 (16.001). Strings longer than 14 bytes are rejected
//! rather than silently truncated.

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 16.xxx character string types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dpt16 {
    /// DPT 16.000 - ASCII string (14 octets)
    Ascii,
    /// DPT 16.001 - ISO 8859-1 (Latin-1) string (14 octets)
    Latin1,
}

impl Dpt16 {
    /// Fixed wire length in octets
    pub const LEN: usize = 14;

    /// Get the DPT identifier string
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Ascii => "16.000",
            Self::Latin1 => "16.001",
        }
    }

    /// Get the unit string (none)
    pub const fn unit(&self) -> &'static str {
        ""
    }
}

impl DptEncode<&str> for Dpt16 {
    fn encode(&self, value: &str, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::LEN {
            return Err(KnxError::buffer_too_small());
        }
        let bytes = match self {
            Self::Ascii => {
                if !value.is_ascii() {
                    return Err(KnxError::dpt_value_out_of_range());
                }
                value.as_bytes()
            }
            Self::Latin1 => value.as_bytes(),
        };
        if bytes.len() > Self::LEN {
            return Err(KnxError::dpt_value_out_of_range());
        }
        buf[..Self::LEN].fill(0);
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self::LEN)
    }
}

impl DptDecode<String> for Dpt16 {
    fn decode(&self, data: &[u8]) -> Result<String> {
        if data.len() < Self::LEN {
            return Err(KnxError::invalid_dpt_data());
        }
        let end = data[..Self::LEN]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(Self::LEN);
        match self {
            Self::Ascii => {
                if !data[..end].is_ascii() {
                    return Err(KnxError::invalid_dpt_data());
                }
                Ok(String::from_utf8_lossy(&data[..end]).into_owned())
            }
            Self::Latin1 => Ok(data[..end].iter().map(|&b| b as char).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_ascii() {
        let mut buf = [0u8; 14];
        let len = Dpt16::Ascii.encode("hello", &mut buf).unwrap();
        assert_eq!(len, 14);
        assert_eq!(Dpt16::Ascii.decode(&buf).unwrap(), "hello");
    }

    #[test]
    fn pads_with_nul() {
        let mut buf = [0xffu8; 14];
        Dpt16::Ascii.encode("ab", &mut buf).unwrap();
        assert_eq!(&buf[2..], &[0u8; 12]);
    }

    #[test]
    fn rejects_too_long() {
        let mut buf = [0u8; 14];
        assert!(Dpt16::Ascii.encode("this string is far too long", &mut buf).is_err());
    }

    #[test]
    fn rejects_non_ascii_for_ascii_variant() {
        let mut buf = [0u8; 14];
        assert!(Dpt16::Ascii.encode("café", &mut buf).is_err());
    }

    #[test]
    fn latin1_accepts_high_bytes() {
        let mut buf = [0u8; 14];
        let len = Dpt16::Latin1.encode("café", &mut buf).unwrap();
        assert_eq!(len, 14);
    }

    #[test]
    fn decode_truncated_input_errors() {
        assert!(Dpt16::Ascii.decode(&[0u8; 5]).is_err());
    }

    #[test]
    fn decode_full_14_bytes_no_nul() {
        let buf = [b'a'; 14];
        assert_eq!(Dpt16::Ascii.decode(&buf).unwrap(), "a".repeat(14));
    }
}
