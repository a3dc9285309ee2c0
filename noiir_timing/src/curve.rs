// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Easing curves and their CSS names.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TimingError;

/// Easing curve for a presentational transition.
///
/// Deserializes from a name (`"easeInOut"`, `"ease-in-out"`, `"cubic-bezier(0.4, 0, 0.2, 1)"`)
/// or a four-element array of Bézier control values.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCurve", into = "String")]
pub enum Curve {
    /// Constant rate.
    Linear,
    /// CSS `ease`.
    #[default]
    Ease,
    /// CSS `ease-in`.
    EaseIn,
    /// CSS `ease-out`.
    EaseOut,
    /// CSS `ease-in-out`.
    EaseInOut,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`.
    CubicBezier([f64; 4]),
}

impl Curve {
    /// Build a Bézier curve from a slice of control values.
    pub fn bezier(values: &[f64]) -> Result<Self, TimingError> {
        match *values {
            [a, b, c, d] => Ok(Self::CubicBezier([a, b, c, d])),
            _ => Err(TimingError::BezierArity(values.len())),
        }
    }
}

impl FromStr for Curve {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(args) = trimmed
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let values = args
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| TimingError::Curve(trimmed.to_owned()))?;
            return Self::bezier(&values);
        }
        let key: String = trimmed
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "linear" => Ok(Self::Linear),
            "ease" => Ok(Self::Ease),
            "easein" => Ok(Self::EaseIn),
            "easeout" => Ok(Self::EaseOut),
            "easeinout" => Ok(Self::EaseInOut),
            _ => Err(TimingError::Curve(trimmed.to_owned())),
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Ease => f.write_str("ease"),
            Self::EaseIn => f.write_str("ease-in"),
            Self::EaseOut => f.write_str("ease-out"),
            Self::EaseInOut => f.write_str("ease-in-out"),
            Self::CubicBezier([a, b, c, d]) => write!(f, "cubic-bezier({a}, {b}, {c}, {d})"),
        }
    }
}

impl From<Curve> for String {
    fn from(c: Curve) -> Self {
        c.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCurve {
    Name(String),
    Points(Vec<f64>),
}

impl TryFrom<RawCurve> for Curve {
    type Error = TimingError;

    fn try_from(raw: RawCurve) -> Result<Self, Self::Error> {
        match raw {
            RawCurve::Name(s) => s.parse(),
            RawCurve::Points(v) => Self::bezier(&v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_curves_accept_camel_and_kebab_case() {
        assert_eq!("easeInOut".parse::<Curve>().unwrap(), Curve::EaseInOut);
        assert_eq!("ease-in-out".parse::<Curve>().unwrap(), Curve::EaseInOut);
        assert_eq!("LINEAR".parse::<Curve>().unwrap(), Curve::Linear);
    }

    #[test]
    fn cubic_bezier_round_trips_through_css() {
        let c: Curve = "cubic-bezier(0.4, 0, 0.2, 1)".parse().unwrap();
        assert_eq!(c, Curve::CubicBezier([0.4, 0.0, 0.2, 1.0]));
        assert_eq!(c.to_string(), "cubic-bezier(0.4, 0, 0.2, 1)");
    }

    #[test]
    fn bezier_arity_is_checked() {
        assert_eq!(
            Curve::bezier(&[0.1, 0.2]),
            Err(TimingError::BezierArity(2))
        );
        assert!(matches!(
            "cubic-bezier(a, b, c, d)".parse::<Curve>(),
            Err(TimingError::Curve(_))
        ));
    }

    #[test]
    fn unknown_name_is_an_error() {
        assert!(matches!("bouncy".parse::<Curve>(), Err(TimingError::Curve(_))));
    }
}
