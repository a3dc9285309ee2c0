// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Noiir Timing: presentational timing metadata for variant transitions.
//!
//! ## Overview
//!
//! Rules that change a frame's variant may carry `delay`, `duration` and `curve`
//! fields. The transition engine never waits on these values; they only describe
//! how the renderer should interpolate between the old and the new property set.
//! This crate parses and formats them.
//!
//! - [`TimeValue`]: a non-negative duration in milliseconds, parsed from plain numbers,
//!   suffixed strings (`"300ms"`, `"0.3s"`) or a named [`Preset`].
//! - [`Curve`]: an easing curve (`ease`, `easeInOut`, `cubic-bezier(..)`, ...).
//! - [`Transition`]: the triple handed to the renderer, formatted as a CSS transition string.
//!
//! ## Minimal example
//!
//! ```
//! use noiir_timing::{Curve, TimeValue, Transition};
//!
//! let t = Transition {
//!     duration: "0.3s".parse().unwrap(),
//!     delay: TimeValue::ZERO,
//!     curve: Curve::EaseOut,
//! };
//! assert_eq!(t.to_css(), "all 300ms ease-out 0ms");
//! ```

pub mod curve;
pub mod duration;

pub use curve::Curve;
pub use duration::{Preset, TimeValue};

use core::fmt;

/// Errors produced while parsing timing values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimingError {
    /// The input was neither a number, a suffixed duration, nor a preset name.
    #[error("unrecognized duration `{0}`")]
    Duration(String),
    /// The duration was negative or not finite.
    #[error("duration out of range: {0}")]
    OutOfRange(f64),
    /// The input did not name a known easing curve.
    #[error("unknown easing curve `{0}`")]
    Curve(String),
    /// A cubic Bézier curve needs exactly four control values.
    #[error("cubic-bezier expects 4 values, got {0}")]
    BezierArity(usize),
}

/// Presentational timing for one variant change.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Transition {
    /// How long the interpolation runs.
    pub duration: TimeValue,
    /// How long the renderer waits before starting the interpolation.
    pub delay: TimeValue,
    /// Easing curve applied over `duration`.
    pub curve: Curve,
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            duration: Preset::Normal.into(),
            delay: TimeValue::ZERO,
            curve: Curve::Ease,
        }
    }
}

impl Transition {
    /// Build a transition, falling back to `base` for every missing field.
    pub fn merged(
        base: &Self,
        duration: Option<TimeValue>,
        delay: Option<TimeValue>,
        curve: Option<&Curve>,
    ) -> Self {
        Self {
            duration: duration.unwrap_or(base.duration),
            delay: delay.unwrap_or(base.delay),
            curve: curve.cloned().unwrap_or_else(|| base.curve.clone()),
        }
    }

    /// CSS `transition` shorthand applied to every property.
    pub fn to_css(&self) -> String {
        self.css_for("all")
    }

    /// CSS `transition` shorthand for a single property.
    pub fn css_for(&self, property: &str) -> String {
        format!("{property} {} {} {}", self.duration, self.curve, self.delay)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transition_is_normal_ease() {
        assert_eq!(Transition::default().to_css(), "all 300ms ease 0ms");
    }

    #[test]
    fn merged_keeps_base_for_missing_fields() {
        let base = Transition::default();
        let t = Transition::merged(&base, Some(TimeValue::from_millis(120.0)), None, None);
        assert_eq!(t.duration.as_millis(), 120.0);
        assert_eq!(t.delay, TimeValue::ZERO);
        assert_eq!(t.curve, Curve::Ease);
    }

    #[test]
    fn css_for_single_property() {
        let t = Transition {
            duration: Preset::Fast.into(),
            delay: TimeValue::from_millis(50.0),
            curve: Curve::Linear,
        };
        assert_eq!(t.css_for("opacity"), "opacity 150ms linear 50ms");
    }

    #[test]
    fn transition_deserializes_mixed_forms() {
        let t: Transition =
            serde_json::from_str(r#"{"duration":"slow","delay":20,"curve":[0.4,0,0.2,1]}"#)
                .unwrap();
        assert_eq!(t.to_css(), "all 500ms cubic-bezier(0.4, 0, 0.2, 1) 20ms");
    }
}
