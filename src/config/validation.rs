// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation.
//!
//! Checks every knob that would otherwise be silently raised to a minimum at
//! construction time (zero capacities, zero workers, zero refill period), and
//! reports all problems at once rather than stopping at the first.
//!
//! ```rust
//! use the_millrace::config::{validate_config, Config};
//! use the_millrace::errors::ValidationError;
//!
//! let mut config = Config::default();
//! assert!(validate_config(&config).is_ok());
//!
//! config.worker_pool.workers = Some(0);
//! let errors = validate_config(&config).unwrap_err();
//! assert_eq!(errors, vec![ValidationError::ZeroWorkers { setting: "worker_pool.workers" }]);
//! ```

use crate::config::Config;
use crate::errors::ValidationError;

/// Validate `cfg`, collecting every error found.
pub fn validate_config(cfg: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let capacities = [
        ("pipeline.channel_capacity", cfg.pipeline.channel_capacity),
        ("broadcast.inbox_capacity", cfg.broadcast.inbox_capacity),
        ("broadcast.outbox_capacity", cfg.broadcast.outbox_capacity),
        ("worker_pool.queue_capacity", cfg.worker_pool.queue_capacity),
        ("rate_limiter.capacity", cfg.rate_limiter.capacity),
    ];
    for (setting, value) in capacities {
        if value == Some(0) {
            errors.push(ValidationError::ZeroCapacity { setting });
        }
    }

    let worker_counts = [
        ("pipeline.fan_out_workers", cfg.pipeline.fan_out_workers),
        ("worker_pool.workers", cfg.worker_pool.workers),
    ];
    for (setting, value) in worker_counts {
        if value == Some(0) {
            errors.push(ValidationError::ZeroWorkers { setting });
        }
    }

    if cfg.rate_limiter.refill_period_ms == Some(0) {
        errors.push(ValidationError::ZeroRefillPeriod);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_explicit_values_are_valid() {
        let mut cfg = Config::default();
        cfg.pipeline.channel_capacity = Some(4);
        cfg.worker_pool.workers = Some(1);
        cfg.rate_limiter.refill_period_ms = Some(1);
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_zero_capacities_are_all_reported() {
        let mut cfg = Config::default();
        cfg.pipeline.channel_capacity = Some(0);
        cfg.broadcast.inbox_capacity = Some(0);
        cfg.rate_limiter.capacity = Some(0);

        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroCapacity {
                    setting: "pipeline.channel_capacity"
                },
                ValidationError::ZeroCapacity {
                    setting: "broadcast.inbox_capacity"
                },
                ValidationError::ZeroCapacity {
                    setting: "rate_limiter.capacity"
                },
            ]
        );
    }

    #[test]
    fn test_zero_workers_and_period() {
        let mut cfg = Config::default();
        cfg.pipeline.fan_out_workers = Some(0);
        cfg.rate_limiter.refill_period_ms = Some(0);

        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains(&ValidationError::ZeroWorkers {
            setting: "pipeline.fan_out_workers"
        }));
        assert!(errors.contains(&ValidationError::ZeroRefillPeriod));
    }
}
