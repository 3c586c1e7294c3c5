//! Description Information Blocks (DIBs).
//!
//! A DIB is a type-length-value structure used in `SEARCH_RESPONSE[_EXTENDED]`
//! and `DESCRIPTION_RESPONSE` bodies: `{length: u8, type: u8, data: [u8]}`.
//! Unknown DIB types are preserved as [`Dib::Other`] rather than rejected, so
//! callers can still walk the DIB list even against gateways advertising
//! types this crate doesn't interpret.

use crate::error::{KnxError, Result};

/// DIB type codes (KNX Core / Core v2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DibType {
    /// Device information (serial, MAC, friendly name, ...)
    DeviceInfo = 0x01,
    /// Supported service families and their versions
    SuppSvcFamilies = 0x02,
    /// Current IP configuration
    IpConfig = 0x03,
    /// Current IP configuration (alternate)
    IpCurConfig = 0x04,
    /// KNX individual addresses served by this interface
    KnxAddresses = 0x05,
    /// Extended device information (core v2)
    ExtendedDeviceInfo = 0x06,
    /// Available tunnelling slots (core v2)
    TunnellingInfo = 0x07,
    /// Secured service families (core v2)
    SecuredServiceFamilies = 0x08,
    /// Manufacturer-specific data
    MfrData = 0xFE,
}

impl DibType {
    const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::DeviceInfo),
            0x02 => Some(Self::SuppSvcFamilies),
            0x03 => Some(Self::IpConfig),
            0x04 => Some(Self::IpCurConfig),
            0x05 => Some(Self::KnxAddresses),
            0x06 => Some(Self::ExtendedDeviceInfo),
            0x07 => Some(Self::TunnellingInfo),
            0x08 => Some(Self::SecuredServiceFamilies),
            0xFE => Some(Self::MfrData),
            _ => None,
        }
    }
}

/// KNX medium codes carried in [`DeviceInfo::knx_medium`].
pub const MEDIUM_TP1: u8 = 0x02;
pub const MEDIUM_IP: u8 = 0x10;

/// Parsed `DEVICE_INFO` DIB (type 0x01).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub knx_medium: u8,
    pub device_status: u8,
    pub individual_address: u16,
    pub project_install_id: u16,
    pub serial_number: [u8; 6],
    pub multicast_address: [u8; 4],
    pub mac_address: [u8; 6],
    /// 30-byte, NUL-padded friendly name.
    pub friendly_name: [u8; 30],
}

impl DeviceInfo {
    fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 52 {
            return Err(KnxError::invalid_dib());
        }

        let mut serial_number = [0u8; 6];
        serial_number.copy_from_slice(&data[6..12]);
        let mut multicast_address = [0u8; 4];
        multicast_address.copy_from_slice(&data[12..16]);
        let mut mac_address = [0u8; 6];
        mac_address.copy_from_slice(&data[16..22]);
        let mut friendly_name = [0u8; 30];
        friendly_name.copy_from_slice(&data[22..52]);

        Ok(Self {
            knx_medium: data[0],
            device_status: data[1],
            individual_address: u16::from_be_bytes([data[2], data[3]]),
            project_install_id: u16::from_be_bytes([data[4], data[5]]),
            serial_number,
            multicast_address,
            mac_address,
            friendly_name,
        })
    }

    /// The friendly name as a UTF-8 string, trimmed at the first NUL.
    pub fn friendly_name_str(&self) -> &str {
        let end = self.friendly_name.iter().position(|&b| b == 0).unwrap_or(self.friendly_name.len());
        core::str::from_utf8(&self.friendly_name[..end]).unwrap_or("")
    }
}

/// One entry of a `SUPP_SVC_FAMILIES` DIB: a service family id and the
/// highest version of it this device supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceFamily {
    pub id: u8,
    pub version: u8,
}

/// A parsed DIB, dispatched on [`DibType`]. Unrecognised types are kept
/// verbatim in [`Dib::Other`] so callers can still enumerate the full DIB
/// set returned by a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dib {
    DeviceInfo(DeviceInfo),
    SuppSvcFamilies(Vec<ServiceFamily>),
    /// `SECURED_SERVICE_FAMILIES` (core v2): the subset of the device's
    /// service families that require KNX/IP Secure.
    SecuredServiceFamilies(Vec<ServiceFamily>),
    Other { dib_type: u8, data: Vec<u8> },
}

impl Dib {
    /// Parse a single DIB starting at the beginning of `data`. Returns the
    /// parsed DIB and the number of bytes consumed.
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < 2 {
            return Err(KnxError::invalid_dib());
        }

        let length = data[0] as usize;
        let dib_type = data[1];

        if length < 2 || data.len() < length {
            return Err(KnxError::invalid_dib());
        }

        let body = &data[2..length];

        let parse_families = |body: &[u8]| -> Result<Vec<ServiceFamily>> {
            if body.len() % 2 != 0 {
                return Err(KnxError::invalid_dib());
            }
            Ok(body
                .chunks_exact(2)
                .map(|pair| ServiceFamily { id: pair[0], version: pair[1] })
                .collect())
        };

        let dib = match DibType::from_u8(dib_type) {
            Some(DibType::DeviceInfo) => Dib::DeviceInfo(DeviceInfo::parse(body)?),
            Some(DibType::SuppSvcFamilies) => Dib::SuppSvcFamilies(parse_families(body)?),
            Some(DibType::SecuredServiceFamilies) => {
                Dib::SecuredServiceFamilies(parse_families(body)?)
            }
            _ => Dib::Other { dib_type, data: body.to_vec() },
        };

        Ok((dib, length))
    }

    /// Parse every DIB in `data`, a concatenated run of DIBs as found in a
    /// `SEARCH_RESPONSE`/`SEARCH_RESPONSE_EXTENDED` tail.
    pub fn parse_all(mut data: &[u8]) -> Result<Vec<Self>> {
        let mut dibs = Vec::new();
        while !data.is_empty() {
            let (dib, consumed) = Self::parse(data)?;
            dibs.push(dib);
            data = &data[consumed..];
        }
        Ok(dibs)
    }

    /// Encoded length of this DIB, including its 2-byte header.
    pub fn len(&self) -> usize {
        match self {
            Self::DeviceInfo(_) => 54,
            Self::SuppSvcFamilies(families) | Self::SecuredServiceFamilies(families) => {
                2 + families.len() * 2
            }
            Self::Other { data, .. } => 2 + data.len(),
        }
    }

    /// Whether this DIB carries no payload beyond its header (never true
    /// for the variants currently produced by this crate; kept for parity
    /// with the `Srp`/`len` pairing elsewhere in this module).
    pub fn is_empty(&self) -> bool {
        self.len() <= 2
    }

    /// Encode this DIB into `buf`, returning the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let total = self.len();
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }

        buf[0] = total as u8;
        match self {
            Self::DeviceInfo(info) => {
                buf[1] = DibType::DeviceInfo as u8;
                buf[2] = info.knx_medium;
                buf[3] = info.device_status;
                buf[4..6].copy_from_slice(&info.individual_address.to_be_bytes());
                buf[6..8].copy_from_slice(&info.project_install_id.to_be_bytes());
                buf[8..14].copy_from_slice(&info.serial_number);
                buf[14..18].copy_from_slice(&info.multicast_address);
                buf[18..24].copy_from_slice(&info.mac_address);
                buf[24..54].copy_from_slice(&info.friendly_name);
            }
            Self::SuppSvcFamilies(families) => {
                buf[1] = DibType::SuppSvcFamilies as u8;
                for (i, family) in families.iter().enumerate() {
                    buf[2 + i * 2] = family.id;
                    buf[3 + i * 2] = family.version;
                }
            }
            Self::SecuredServiceFamilies(families) => {
                buf[1] = DibType::SecuredServiceFamilies as u8;
                for (i, family) in families.iter().enumerate() {
                    buf[2 + i * 2] = family.id;
                    buf[3 + i * 2] = family.version;
                }
            }
            Self::Other { dib_type, data } => {
                buf[1] = *dib_type;
                buf[2..2 + data.len()].copy_from_slice(data);
            }
        }

        Ok(total)
    }

    /// Encode a whole DIB list back-to-back, as found in a
    /// `SEARCH_RESPONSE`/`SEARCH_RESPONSE_EXTENDED` tail.
    pub fn encode_all(dibs: &[Self], buf: &mut [u8]) -> Result<usize> {
        let mut offset = 0;
        for dib in dibs {
            offset += dib.encode(&mut buf[offset..])?;
        }
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_info_bytes() -> Vec<u8> {
        let mut buf = vec![0u8; 54];
        buf[0] = 54; // length
        buf[1] = DibType::DeviceInfo as u8;
        buf[2] = MEDIUM_TP1;
        buf[3] = 0x00; // status
        buf[4..6].copy_from_slice(&[0x11, 0x01]); // individual address
        buf[6..8].copy_from_slice(&[0x00, 0x00]); // project install id
        buf[8..14].copy_from_slice(&[1, 2, 3, 4, 5, 6]); // serial
        buf[14..18].copy_from_slice(&[224, 0, 23, 12]); // multicast
        buf[18..24].copy_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]); // mac
        buf[24..38].copy_from_slice(b"Test Gateway\0\0");
        buf
    }

    #[test]
    fn parse_device_info() {
        let bytes = device_info_bytes();
        let (dib, consumed) = Dib::parse(&bytes).unwrap();
        assert_eq!(consumed, 54);
        match dib {
            Dib::DeviceInfo(info) => {
                assert_eq!(info.knx_medium, MEDIUM_TP1);
                assert_eq!(info.individual_address, 0x1101);
                assert!(info.friendly_name_str().starts_with("Test Gateway"));
            }
            other => panic!("expected DeviceInfo, got {other:?}"),
        }
    }

    #[test]
    fn parse_supp_svc_families() {
        let data = [6, DibType::SuppSvcFamilies as u8, 0x02, 0x01, 0x04, 0x01];
        let (dib, consumed) = Dib::parse(&data).unwrap();
        assert_eq!(consumed, 6);
        match dib {
            Dib::SuppSvcFamilies(families) => {
                assert_eq!(families, vec![ServiceFamily { id: 0x02, version: 0x01 }, ServiceFamily { id: 0x04, version: 0x01 }]);
            }
            other => panic!("expected SuppSvcFamilies, got {other:?}"),
        }
    }

    #[test]
    fn parse_unknown_type_preserved() {
        let data = [4, 0xFE, 0xAA, 0xBB];
        let (dib, consumed) = Dib::parse(&data).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(dib, Dib::Other { dib_type: 0xFE, data: vec![0xAA, 0xBB] });
    }

    #[test]
    fn parse_all_concatenated() {
        let mut data = Vec::new();
        data.extend_from_slice(&[4, 0xFE, 0xAA, 0xBB]);
        data.extend_from_slice(&[6, DibType::SuppSvcFamilies as u8, 0x02, 0x01, 0x04, 0x01]);

        let dibs = Dib::parse_all(&data).unwrap();
        assert_eq!(dibs.len(), 2);
    }

    #[test]
    fn parse_secured_service_families_distinct_from_supported() {
        let data = [4, DibType::SecuredServiceFamilies as u8, 0x04, 0x02];
        let (dib, consumed) = Dib::parse(&data).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(
            dib,
            Dib::SecuredServiceFamilies(vec![ServiceFamily { id: 0x04, version: 0x02 }])
        );
    }

    #[test]
    fn truncated_dib_is_error() {
        let data = [10, DibType::DeviceInfo as u8, 1, 2];
        assert!(Dib::parse(&data).is_err());
    }

    #[test]
    fn device_info_round_trips_through_encode() {
        let bytes = device_info_bytes();
        let (dib, _) = Dib::parse(&bytes).unwrap();

        let mut out = vec![0u8; dib.len()];
        let written = dib.encode(&mut out).unwrap();
        assert_eq!(written, bytes.len());
        assert_eq!(out, bytes);
    }

    #[test]
    fn encode_all_concatenates_dibs() {
        let dibs = vec![
            Dib::SuppSvcFamilies(vec![ServiceFamily { id: 0x02, version: 0x01 }]),
            Dib::Other { dib_type: 0xFE, data: vec![0xAA, 0xBB] },
        ];
        let total: usize = dibs.iter().map(Dib::len).sum();
        let mut buf = vec![0u8; total];
        let written = Dib::encode_all(&dibs, &mut buf).unwrap();
        assert_eq!(written, total);

        let parsed = Dib::parse_all(&buf).unwrap();
        assert_eq!(parsed, dibs);
    }
}
