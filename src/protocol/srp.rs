//! Search Request Parameters (SRPs), used by `SEARCH_REQUEST_EXTENDED` to
//! filter gateway discovery (KNXnet/IP Core v2).
//!
//! Each SRP is `{length: u8, type_and_mandatory: u8, data: [u8]}`; bit 7 of
//! the type byte is the "mandatory" flag -- a gateway that doesn't
//! understand a mandatory SRP must not respond at all.

use crate::error::{KnxError, Result};

const MANDATORY_BIT: u8 = 0x80;

/// SRP type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SrpType {
    /// Only respond if the device is in programming mode.
    SelectByProgrammingMode = 0x01,
    /// Only respond if the device's MAC address matches.
    SelectByMacAddress = 0x02,
    /// Only respond if the device supports a given service family/version.
    SelectByService = 0x03,
    /// Ask the gateway to include specific DIB types in its response.
    RequestDibs = 0x04,
}

/// A single search request parameter to embed in `SEARCH_REQUEST_EXTENDED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Srp {
    ProgrammingMode,
    MacAddress([u8; 6]),
    Service { family: u8, version: u8 },
    RequestDibs(Vec<u8>),
}

impl Srp {
    /// Whether this SRP should be marked mandatory (the standard requires
    /// selection SRPs to be mandatory; `RequestDibs` is informational and
    /// left optional).
    const fn mandatory(&self) -> bool {
        !matches!(self, Self::RequestDibs(_))
    }

    const fn srp_type(&self) -> SrpType {
        match self {
            Self::ProgrammingMode => SrpType::SelectByProgrammingMode,
            Self::MacAddress(_) => SrpType::SelectByMacAddress,
            Self::Service { .. } => SrpType::SelectByService,
            Self::RequestDibs(_) => SrpType::RequestDibs,
        }
    }

    /// Encoded length of this SRP, including its 2-byte header.
    pub fn len(&self) -> usize {
        2 + match self {
            Self::ProgrammingMode => 0,
            Self::MacAddress(_) => 6,
            Self::Service { .. } => 2,
            Self::RequestDibs(types) => types.len(),
        }
    }

    /// Whether this SRP carries no payload beyond its header.
    pub fn is_empty(&self) -> bool {
        self.len() == 2
    }

    /// Encode this SRP into `buf`, returning the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let total = self.len();
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }

        buf[0] = total as u8;
        buf[1] = self.srp_type() as u8 | if self.mandatory() { MANDATORY_BIT } else { 0 };

        match self {
            Self::ProgrammingMode => {}
            Self::MacAddress(mac) => buf[2..8].copy_from_slice(mac),
            Self::Service { family, version } => {
                buf[2] = *family;
                buf[3] = *version;
            }
            Self::RequestDibs(types) => buf[2..2 + types.len()].copy_from_slice(types),
        }

        Ok(total)
    }

    /// Parse a single SRP from the front of `data`, returning the SRP and
    /// the number of bytes consumed.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < 2 {
            return Err(KnxError::invalid_srp());
        }

        let length = data[0] as usize;
        if length < 2 || data.len() < length {
            return Err(KnxError::invalid_srp());
        }

        let raw_type = data[1] & !MANDATORY_BIT;
        let body = &data[2..length];

        let srp = match raw_type {
            0x01 => Self::ProgrammingMode,
            0x02 => {
                if body.len() != 6 {
                    return Err(KnxError::invalid_srp());
                }
                let mut mac = [0u8; 6];
                mac.copy_from_slice(body);
                Self::MacAddress(mac)
            }
            0x03 => {
                if body.len() != 2 {
                    return Err(KnxError::invalid_srp());
                }
                Self::Service { family: body[0], version: body[1] }
            }
            0x04 => Self::RequestDibs(body.to_vec()),
            _ => return Err(KnxError::invalid_srp()),
        };

        Ok((srp, length))
    }
}
