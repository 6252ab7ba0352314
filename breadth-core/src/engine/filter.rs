//! Trend filters on an instrument's position relative to its EMAs.
//!
//! Two independent filters, AND-combined:
//! - short trend, on `above_ema5`
//! - long trend, on `above_ema20`
//!
//! Each is unset (`None`), `Above` or `Below`. A [`FilterSet`] doubles as the
//! report cache key, so the key space is the nine filter combinations.

use crate::domain::InstrumentSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendFilter {
    Above,
    Below,
}

impl TrendFilter {
    /// Whether an instrument's above/below flag satisfies this filter.
    pub fn admits(self, above: bool) -> bool {
        match self {
            Self::Above => above,
            Self::Below => !above,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown trend filter '{0}' (expected 'above' or 'below')")]
pub struct ParseTrendFilterError(String);

impl FromStr for TrendFilter {
    type Err = ParseTrendFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" => Ok(Self::Above),
            "below" => Ok(Self::Below),
            _ => Err(ParseTrendFilterError(s.to_string())),
        }
    }
}

impl fmt::Display for TrendFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active filter combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSet {
    pub short_trend: Option<TrendFilter>,
    pub long_trend: Option<TrendFilter>,
}

impl FilterSet {
    pub fn new(short_trend: Option<TrendFilter>, long_trend: Option<TrendFilter>) -> Self {
        Self {
            short_trend,
            long_trend,
        }
    }

    /// No constraint on either trend.
    pub fn unfiltered() -> Self {
        Self::default()
    }

    /// All nine combinations, unfiltered first.
    pub fn all() -> impl Iterator<Item = FilterSet> {
        let states = [None, Some(TrendFilter::Above), Some(TrendFilter::Below)];
        states
            .into_iter()
            .flat_map(move |short| states.into_iter().map(move |long| Self::new(short, long)))
    }

    /// Both active filters hold for the snapshot.
    pub fn admits(&self, snapshot: &InstrumentSnapshot) -> bool {
        self.short_trend.map_or(true, |f| f.admits(snapshot.above_ema5))
            && self.long_trend.map_or(true, |f| f.admits(snapshot.above_ema20))
    }
}

impl fmt::Display for FilterSet {
    /// Stable `short_long` form, `unset` standing in for an absent filter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |t: Option<TrendFilter>| t.map_or("unset", TrendFilter::as_str);
        write!(f, "{}_{}", part(self.short_trend), part(self.long_trend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn snap(above_ema5: bool, above_ema20: bool) -> InstrumentSnapshot {
        InstrumentSnapshot::new("X", 100.0, 1.0, 1.0, above_ema5, above_ema20)
    }

    #[test]
    fn unfiltered_admits_everything() {
        let f = FilterSet::unfiltered();
        for (a, b) in [(true, true), (true, false), (false, true), (false, false)] {
            assert!(f.admits(&snap(a, b)));
        }
    }

    #[test]
    fn filters_combine_with_and() {
        let f = FilterSet::new(Some(TrendFilter::Above), Some(TrendFilter::Above));
        // Satisfies the short filter alone, fails the long one.
        assert!(!f.admits(&snap(true, false)));
        assert!(f.admits(&snap(true, true)));
    }

    #[test]
    fn below_requires_flag_false() {
        let f = FilterSet::new(Some(TrendFilter::Below), None);
        assert!(f.admits(&snap(false, true)));
        assert!(!f.admits(&snap(true, true)));

        let f = FilterSet::new(None, Some(TrendFilter::Below));
        assert!(f.admits(&snap(true, false)));
        assert!(!f.admits(&snap(false, true)));
    }

    #[test]
    fn nine_distinct_keys() {
        let keys: HashSet<String> = FilterSet::all().map(|f| f.to_string()).collect();
        assert_eq!(keys.len(), 9);
        assert!(keys.contains("unset_unset"));
        assert!(keys.contains("above_below"));
        assert_eq!(FilterSet::all().next(), Some(FilterSet::unfiltered()));
    }

    #[test]
    fn parses_filter_strings() {
        assert_eq!("above".parse::<TrendFilter>().unwrap(), TrendFilter::Above);
        assert_eq!(" BELOW ".parse::<TrendFilter>().unwrap(), TrendFilter::Below);
        assert!("sideways".parse::<TrendFilter>().is_err());
    }
}
