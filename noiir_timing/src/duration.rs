// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Durations: plain milliseconds, suffixed strings, and named presets.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TimingError;

/// Named duration shorthand.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Preset {
    /// 0ms.
    Instant,
    /// 150ms.
    Fast,
    /// 300ms.
    Normal,
    /// 500ms.
    Slow,
    /// 800ms.
    Slower,
}

impl Preset {
    /// Fixed millisecond value of the preset.
    pub const fn millis(self) -> f64 {
        match self {
            Self::Instant => 0.0,
            Self::Fast => 150.0,
            Self::Normal => 300.0,
            Self::Slow => 500.0,
            Self::Slower => 800.0,
        }
    }

    /// Look up a preset by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "instant" => Some(Self::Instant),
            "fast" => Some(Self::Fast),
            "normal" => Some(Self::Normal),
            "slow" => Some(Self::Slow),
            "slower" => Some(Self::Slower),
            _ => None,
        }
    }
}

/// A non-negative, finite duration in milliseconds.
///
/// Parses from:
/// - plain numbers (`300`, `"300"`), read as milliseconds;
/// - suffixed strings (`"300ms"`, `"0.3s"`);
/// - preset names (`"fast"`, see [`Preset`]).
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTime", into = "f64")]
pub struct TimeValue(f64);

impl TimeValue {
    /// Zero milliseconds.
    pub const ZERO: Self = Self(0.0);

    /// Build from milliseconds, clamping negative and non-finite input to zero.
    pub fn from_millis(ms: f64) -> Self {
        if ms.is_finite() && ms > 0.0 {
            Self(ms)
        } else {
            Self::ZERO
        }
    }

    /// Validate a millisecond value.
    pub fn try_from_millis(ms: f64) -> Result<Self, TimingError> {
        if ms.is_finite() && ms >= 0.0 {
            Ok(Self(ms))
        } else {
            Err(TimingError::OutOfRange(ms))
        }
    }

    /// Value in milliseconds.
    pub const fn as_millis(self) -> f64 {
        self.0
    }

    /// Value as a [`core::time::Duration`], rounded down to whole microseconds.
    pub fn as_duration(self) -> core::time::Duration {
        // Truncation is intended; sub-microsecond precision is not meaningful here.
        #[allow(clippy::cast_possible_truncation, reason = "value is finite and non-negative")]
        let micros = (self.0 * 1000.0) as u64;
        core::time::Duration::from_micros(micros)
    }
}

impl From<Preset> for TimeValue {
    fn from(p: Preset) -> Self {
        Self(p.millis())
    }
}

impl From<TimeValue> for f64 {
    fn from(t: TimeValue) -> Self {
        t.0
    }
}

impl FromStr for TimeValue {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(p) = Preset::from_name(s) {
            return Ok(p.into());
        }
        let bad = || TimingError::Duration(s.to_owned());
        let ms = if let Some(n) = s.strip_suffix("ms") {
            n.trim().parse::<f64>().map_err(|_| bad())?
        } else if let Some(n) = s.strip_suffix('s') {
            n.trim().parse::<f64>().map_err(|_| bad())? * 1000.0
        } else {
            s.parse::<f64>().map_err(|_| bad())?
        };
        Self::try_from_millis(ms)
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTime {
    Number(f64),
    Text(String),
}

impl TryFrom<RawTime> for TimeValue {
    type Error = TimingError;

    fn try_from(raw: RawTime) -> Result<Self, Self::Error> {
        match raw {
            RawTime::Number(ms) => Self::try_from_millis(ms),
            RawTime::Text(s) => s.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixes_and_plain_numbers() {
        assert_eq!("300ms".parse::<TimeValue>().unwrap().as_millis(), 300.0);
        assert_eq!("0.3s".parse::<TimeValue>().unwrap().as_millis(), 300.0);
        assert_eq!(" 120 ".parse::<TimeValue>().unwrap().as_millis(), 120.0);
    }

    #[test]
    fn parses_presets_case_insensitively() {
        assert_eq!("Fast".parse::<TimeValue>().unwrap().as_millis(), 150.0);
        assert_eq!("slower".parse::<TimeValue>().unwrap().as_millis(), 800.0);
        assert_eq!("instant".parse::<TimeValue>().unwrap(), TimeValue::ZERO);
    }

    #[test]
    fn rejects_garbage_and_negative() {
        assert!(matches!(
            "soon".parse::<TimeValue>(),
            Err(TimingError::Duration(_))
        ));
        assert!(matches!(
            "-5ms".parse::<TimeValue>(),
            Err(TimingError::OutOfRange(_))
        ));
    }

    #[test]
    fn from_millis_clamps() {
        assert_eq!(TimeValue::from_millis(-3.0), TimeValue::ZERO);
        assert_eq!(TimeValue::from_millis(f64::NAN), TimeValue::ZERO);
    }

    #[test]
    fn as_duration_converts_milliseconds() {
        let t = TimeValue::from_millis(1.5);
        assert_eq!(t.as_duration(), core::time::Duration::from_micros(1500));
    }

    #[test]
    fn display_uses_ms_suffix() {
        assert_eq!(TimeValue::from_millis(300.0).to_string(), "300ms");
        assert_eq!(TimeValue::from_millis(12.5).to_string(), "12.5ms");
    }
}
