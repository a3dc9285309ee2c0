// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration, loadable from TOML.
//!
//! ```
//! use noiir_variants::config::EngineConfig;
//!
//! let cfg = EngineConfig::from_toml_str(r#"
//!     visibility_threshold = 0.5
//!     default_scroll_behavior = "instant"
//!
//!     [default_transition]
//!     duration = "fast"
//!     curve = "easeOut"
//! "#).unwrap();
//! assert_eq!(cfg.visibility_threshold, 0.5);
//! assert_eq!(cfg.default_transition.to_css(), "all 150ms ease-out 0ms");
//! assert_eq!(cfg.max_tasks_per_flush, 1024);
//! ```

use std::path::Path;

use noiir_timing::Transition;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rule::ScrollBehavior;

/// Tunables for an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Intersection ratio in `(0, 1]` at which an element counts as visible.
    pub visibility_threshold: f64,
    /// Scroll animation for `scrollTo` actions that don't name one.
    pub default_scroll_behavior: ScrollBehavior,
    /// Upper bound on deferred tasks drained by one outer call.
    ///
    /// Stops `listen` rules that feed each other from looping forever.
    pub max_tasks_per_flush: usize,
    /// Timing used for commits whose rule carries none.
    pub default_transition: Transition,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.1,
            default_scroll_behavior: ScrollBehavior::Smooth,
            max_tasks_per_flush: 1024,
            default_transition: Transition::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let cfg = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded engine config");
        Ok(cfg)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.visibility_threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ConfigError::Threshold(t));
        }
        if self.max_tasks_per_flush == 0 {
            return Err(ConfigError::EmptyBudget);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noiir_timing::{Curve, TimeValue};

    #[test]
    fn empty_document_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn default_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        for bad in ["visibility_threshold = 0.0", "visibility_threshold = 1.5"] {
            assert!(matches!(
                EngineConfig::from_toml_str(bad),
                Err(ConfigError::Threshold(_))
            ));
        }
        assert!(matches!(
            EngineConfig::from_toml_str("visibility_threshold = nan"),
            Err(ConfigError::Threshold(_))
        ));
    }

    #[test]
    fn zero_budget_is_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("max_tasks_per_flush = 0"),
            Err(ConfigError::EmptyBudget)
        ));
    }

    #[test]
    fn parse_errors_surface() {
        assert!(matches!(
            EngineConfig::from_toml_str("visibility_threshold = \"high\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn transition_accepts_timing_strings() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            [default_transition]
            duration = "0.2s"
            delay = 50
            curve = "cubic-bezier(0.1, 0.2, 0.3, 0.4)"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.default_transition.duration, TimeValue::from_millis(200.0));
        assert_eq!(cfg.default_transition.delay, TimeValue::from_millis(50.0));
        assert_eq!(
            cfg.default_transition.curve,
            Curve::CubicBezier([0.1, 0.2, 0.3, 0.4])
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            EngineConfig::load_from_file("/nonexistent/noiir.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
