//! DPT 19.001 - Date and Time (8 octets)
//!
//! Wire layout:
//! - octet 0: year - 1900
//! - octet 1: day-of-week (bits 7-5) + month (bits 4-0)
//! - octet 2: day of month (bits 4-0)
//! - octet 3: day-of-week (bits 7-5) + hour (bits 4-0)
//! - octet 4: minutes (bits 5-0)
//! - octet 5: seconds (bits 5-0)
//! - octet 6: flags (fault, working day, working day valid, year valid, ...)
//! - octet 7: flags (clock quality)
//!
//! This implementation keeps day-of-week packed alongside hour as the KNX
//! standard specifies, and round-trips the status flags defined by
//! spec.md's supplement rather than dropping them.

use crate::dpt::{DptDecode, DptEncode};
use crate::error::{KnxError, Result};

/// Day of week, 1 = Monday .. 7 = Sunday, 0 = no day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOfWeek {
    /// No day specified
    None,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Monday,
            2 => Self::Tuesday,
            3 => Self::Wednesday,
            4 => Self::Thursday,
            5 => Self::Friday,
            6 => Self::Saturday,
            7 => Self::Sunday,
            _ => Self::None,
        }
    }

    const fn to_bits(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
            Self::Sunday => 7,
        }
    }
}

/// A decoded DPT 19.001 date-time value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub day_of_week: DayOfWeek,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub fault: bool,
    pub working_day: bool,
    pub working_day_valid: bool,
    pub year_valid: bool,
    pub month_day_valid: bool,
    pub day_of_week_valid: bool,
    pub time_valid: bool,
    pub clock_quality_external: bool,
}

/// DPT 19.001 - Date and Time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dpt19 {
    /// DPT 19.001 - combined date and time
    DateTime,
}

impl Dpt19 {
    pub const LEN: usize = 8;

    pub const fn identifier(&self) -> &'static str {
        "19.001"
    }

    pub const fn unit(&self) -> &'static str {
        ""
    }
}

impl DptEncode<DateTime> for Dpt19 {
    fn encode(&self, value: DateTime, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::LEN {
            return Err(KnxError::buffer_too_small());
        }
        if value.year < 1900 || value.year > 2155 || value.month == 0 || value.month > 12 {
            return Err(KnxError::dpt_value_out_of_range());
        }

        buf[0] = (value.year - 1900) as u8;
        buf[1] = (value.day_of_week.to_bits() << 5) | (value.month & 0x1F);
        buf[2] = value.day & 0x1F;
        buf[3] = (value.day_of_week.to_bits() << 5) | (value.hour & 0x1F);
        buf[4] = value.minute & 0x3F;
        buf[5] = value.second & 0x3F;
        buf[6] = (u8::from(value.fault) << 7)
            | (u8::from(value.working_day) << 6)
            | (u8::from(value.working_day_valid) << 5)
            | (u8::from(value.year_valid) << 4)
            | (u8::from(value.month_day_valid) << 3)
            | (u8::from(value.day_of_week_valid) << 2)
            | (u8::from(value.time_valid) << 1);
        buf[7] = u8::from(value.clock_quality_external) << 7;
        Ok(Self::LEN)
    }
}

impl DptDecode<DateTime> for Dpt19 {
    fn decode(&self, data: &[u8]) -> Result<DateTime> {
        if data.len() < Self::LEN {
            return Err(KnxError::invalid_dpt_data());
        }
        let dow_bits = (data[1] >> 5) & 0x07;
        Ok(DateTime {
            year: 1900 + u16::from(data[0]),
            month: data[1] & 0x1F,
            day: data[2] & 0x1F,
            day_of_week: DayOfWeek::from_bits(dow_bits),
            hour: data[3] & 0x1F,
            minute: data[4] & 0x3F,
            second: data[5] & 0x3F,
            fault: data[6] & 0x80 != 0,
            working_day: data[6] & 0x40 != 0,
            working_day_valid: data[6] & 0x20 != 0,
            year_valid: data[6] & 0x10 != 0,
            month_day_valid: data[6] & 0x08 != 0,
            day_of_week_valid: data[6] & 0x04 != 0,
            time_valid: data[6] & 0x02 != 0,
            clock_quality_external: data[7] & 0x80 != 0,
        })
    }
}
