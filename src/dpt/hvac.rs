//! DPT 20.102 / 20.105 - HVAC Mode Enumerations (1 octet)
//!
//! Both are single-octet enumerations from the DPT 20 "1-byte enum" family;
//! unrecognised values are rejected rather than silently coerced, matching
//! the closed-enum semantics of DPT 20 in the KNX standard.

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// DPT 20.102 - HVAC operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    Auto = 0,
    Comfort = 1,
    Standby = 2,
    Economy = 3,
    BuildingProtection = 4,
}

impl HvacMode {
    const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Auto),
            1 => Some(Self::Comfort),
            2 => Some(Self::Standby),
            3 => Some(Self::Economy),
            4 => Some(Self::BuildingProtection),
            _ => None,
        }
    }
}

/// DPT 20.105 - HVAC controller mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacControllerMode {
    Auto = 0,
    Heat = 1,
    MorningWarmup = 2,
    Cool = 3,
    NightPurge = 4,
    Precool = 5,
    Off = 6,
    Test = 7,
    EmergencyHeat = 8,
    FanOnly = 9,
    FreeCool = 10,
    Ice = 11,
    MaximumHeatingMode = 12,
    EconomicHeatCoolMode = 13,
    Dehumidification = 14,
    CalibrationMode = 15,
    EmergencyCoolMode = 16,
    EmergencySteamMode = 17,
    NoDemand = 20,
}

impl HvacControllerMode {
    const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Auto),
            1 => Some(Self::Heat),
            2 => Some(Self::MorningWarmup),
            3 => Some(Self::Cool),
            4 => Some(Self::NightPurge),
            5 => Some(Self::Precool),
            6 => Some(Self::Off),
            7 => Some(Self::Test),
            8 => Some(Self::EmergencyHeat),
            9 => Some(Self::FanOnly),
            10 => Some(Self::FreeCool),
            11 => Some(Self::Ice),
            12 => Some(Self::MaximumHeatingMode),
            13 => Some(Self::EconomicHeatCoolMode),
            14 => Some(Self::Dehumidification),
            15 => Some(Self::CalibrationMode),
            16 => Some(Self::EmergencyCoolMode),
            17 => Some(Self::EmergencySteamMode),
            20 => Some(Self::NoDemand),
            _ => None,
        }
    }
}

/// DPT 20.xxx HVAC enumerations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dpt20 {
    /// DPT 20.102 - HVAC operating mode
    HvacMode,
    /// DPT 20.105 - HVAC controller mode
    HvacControllerMode,
}

impl Dpt20 {
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::HvacMode => "20.102",
            Self::HvacControllerMode => "20.105",
        }
    }

    pub const fn unit(&self) -> &'static str {
        ""
    }
}

impl DptEncode<HvacMode> for Dpt20 {
    fn encode(&self, value: HvacMode, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = value as u8;
        Ok(1)
    }
}

impl DptDecode<HvacMode> for Dpt20 {
    fn decode(&self, data: &[u8]) -> Result<HvacMode> {
        let byte = *data.first().ok_or_else(KnxError::invalid_dpt_data)?;
        HvacMode::from_u8(byte).ok_or_else(KnxError::dpt_value_out_of_range)
    }
}

impl DptEncode<HvacControllerMode> for Dpt20 {
    fn encode(&self, value: HvacControllerMode, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = value as u8;
        Ok(1)
    }
}

impl DptDecode<HvacControllerMode> for Dpt20 {
    fn decode(&self, data: &[u8]) -> Result<HvacControllerMode> {
        let byte = *data.first().ok_or_else(KnxError::invalid_dpt_data)?;
        HvacControllerMode::from_u8(byte).ok_or_else(KnxError::dpt_value_out_of_range)
    }
}
