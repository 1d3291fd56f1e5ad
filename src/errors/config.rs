// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// Errors found while validating a loaded configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A capacity knob was set to zero
    ZeroCapacity {
        /// Dotted path of the offending setting, e.g. `worker_pool.queue_capacity`
        setting: &'static str,
    },
    /// A worker count was set to zero
    ZeroWorkers {
        /// Dotted path of the offending setting
        setting: &'static str,
    },
    /// The rate limiter refill period was zero
    ZeroRefillPeriod,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroCapacity { setting } => {
                write!(f, "Setting '{}' must be a capacity of at least 1", setting)
            }
            ValidationError::ZeroWorkers { setting } => {
                write!(f, "Setting '{}' must name at least 1 worker", setting)
            }
            ValidationError::ZeroRefillPeriod => {
                write!(f, "Setting 'rate_limiter.refill_period_ms' must be greater than 0")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file was not valid YAML for [`crate::config::Config`].
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file was not valid TOML for [`crate::config::Config`].
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension does not map to a supported format.
    #[error("Unsupported config format: '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(String),

    /// The file parsed but failed validation.
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
