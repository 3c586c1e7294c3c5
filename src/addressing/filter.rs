//! Address filters gating telegram callbacks on a group address.
//!
//! A filter pattern is matched level-by-level against a 3-level group
//! address string (`main/middle/sub`). Each level may be:
//! - a literal number,
//! - `*` (matches anything),
//! - a character class `[a-b]` (inclusive numeric range),
//! - a set `{a,b,c}` (explicit alternatives).

use crate::addressing::GroupAddress;
use crate::error::{KnxError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum LevelPattern {
    Any,
    Literal(u16),
    Range(u16, u16),
    Set(Vec<u16>),
}

impl LevelPattern {
    fn parse(segment: &str) -> Result<Self> {
        if segment == "*" {
            return Ok(Self::Any);
        }
        if let Some(inner) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let (lo, hi) = inner
                .split_once('-')
                .ok_or_else(KnxError::invalid_filter)?;
            let lo: u16 = lo.parse().map_err(|_| KnxError::invalid_filter())?;
            let hi: u16 = hi.parse().map_err(|_| KnxError::invalid_filter())?;
            return Ok(Self::Range(lo, hi));
        }
        if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            let values = inner
                .split(',')
                .map(|v| v.parse::<u16>().map_err(|_| KnxError::invalid_filter()))
                .collect::<Result<Vec<_>>>()?;
            if values.is_empty() {
                return Err(KnxError::invalid_filter());
            }
            return Ok(Self::Set(values));
        }
        let literal: u16 = segment.parse().map_err(|_| KnxError::invalid_filter())?;
        Ok(Self::Literal(literal))
    }

    fn matches(&self, value: u16) -> bool {
        match self {
            Self::Any => true,
            Self::Literal(v) => *v == value,
            Self::Range(lo, hi) => (*lo..=*hi).contains(&value),
            Self::Set(values) => values.contains(&value),
        }
    }
}

/// A compiled group-address filter, e.g. `"1/2/*"`, `"1/4/[5-6]"`, or
/// `"1/4/{8,10}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFilter {
    main: LevelPattern,
    middle: LevelPattern,
    sub: LevelPattern,
}

impl AddressFilter {
    /// Compile a filter pattern in `main/middle/sub` form.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not have exactly three segments
    /// or any segment is malformed.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut parts = pattern.split('/');
        let main = LevelPattern::parse(parts.next().ok_or_else(KnxError::invalid_filter)?)?;
        let middle = LevelPattern::parse(parts.next().ok_or_else(KnxError::invalid_filter)?)?;
        let sub = LevelPattern::parse(parts.next().ok_or_else(KnxError::invalid_filter)?)?;
        if parts.next().is_some() {
            return Err(KnxError::invalid_filter());
        }
        Ok(Self { main, middle, sub })
    }

    /// A filter that matches every group address.
    pub fn any() -> Self {
        Self {
            main: LevelPattern::Any,
            middle: LevelPattern::Any,
            sub: LevelPattern::Any,
        }
    }

    /// Whether this filter matches the given group address.
    pub fn matches(&self, addr: GroupAddress) -> bool {
        self.main.matches(u16::from(addr.main()))
            && self.middle.matches(u16::from(addr.middle()))
            && self.sub.matches(u16::from(addr.sub()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ga(s: &str) -> GroupAddress {
        s.parse().unwrap()
    }

    #[test]
    fn wildcard_matches_any_sub() {
        let f = AddressFilter::parse("1/2/*").unwrap();
        assert!(f.matches(ga("1/2/7")));
        assert!(!f.matches(ga("1/3/7")));
    }

    #[test]
    fn range_matches_inclusive_bounds() {
        let f = AddressFilter::parse("1/4/[5-6]").unwrap();
        assert!(f.matches(ga("1/4/5")));
        assert!(f.matches(ga("1/4/6")));
        assert!(!f.matches(ga("1/4/7")));
    }

    #[test]
    fn set_matches_only_listed_values() {
        let f = AddressFilter::parse("1/4/{8,10}").unwrap();
        assert!(f.matches(ga("1/4/8")));
        assert!(f.matches(ga("1/4/10")));
        assert!(!f.matches(ga("1/4/9")));
    }

    #[test]
    fn invalid_pattern_rejected() {
        assert!(AddressFilter::parse("1/2").is_err());
        assert!(AddressFilter::parse("1/2/[5]").is_err());
        assert!(AddressFilter::parse("1/2/{}").is_err());
    }
}
