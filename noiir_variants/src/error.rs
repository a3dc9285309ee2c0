// Copyright 2025 the Noiir Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Authoring-time error types.
//!
//! Dispatch never fails; these only surface while parsing rules or loading configuration.

use thiserror::Error;

/// Errors raised while parsing an authored rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// The trigger string names no known trigger kind.
    #[error("unknown trigger `{0}`")]
    UnknownTrigger(String),

    /// A cross-frame trigger had an empty entity or event half.
    #[error("malformed channel trigger `{0}`")]
    MalformedChannel(String),

    /// A timing field could not be parsed.
    #[error("invalid timing value: {0}")]
    Timing(#[from] noiir_timing::TimingError),
}

/// Errors raised while loading an engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration was not valid TOML for [`EngineConfig`](crate::config::EngineConfig).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The visibility threshold must lie in `(0, 1]`.
    #[error("visibility threshold {0} is outside (0, 1]")]
    Threshold(f64),

    /// The propagation budget must be at least one task.
    #[error("max_tasks_per_flush must be at least 1")]
    EmptyBudget,
}
