// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{load_and_validate_config, RuntimeBuilder};
use crate::errors::{ConfigError, ValidationError};
use crate::streams::{fan_out_fan_in, generate};
use tokio_util::sync::CancellationToken;

/// The shipped YAML config loads and validates
#[test]
fn test_sample_yaml_loading() {
    let config = load_and_validate_config("configs/millrace.yaml").unwrap();

    assert_eq!(config.pipeline.get_channel_capacity(), 1);
    assert_eq!(config.pipeline.get_fan_out_workers(), 3);
    assert_eq!(config.worker_pool.get_workers(), 3);
    assert_eq!(config.worker_pool.get_queue_capacity(), 100);
    assert_eq!(config.rate_limiter.get_capacity(), 3);
}

/// The TOML variant carries the same settings except where it overrides
#[test]
fn test_sample_toml_loading() {
    let yaml = load_and_validate_config("configs/millrace.yaml").unwrap();
    let toml = load_and_validate_config("configs/millrace.toml").unwrap();

    assert_eq!(toml.worker_pool.get_workers(), yaml.worker_pool.get_workers());
    assert_eq!(toml.rate_limiter.get_refill_period(), yaml.rate_limiter.get_refill_period());
    assert_eq!(toml.broadcast.get_outbox_capacity(), 2);
    assert_eq!(toml.broadcast.get_inbox_capacity(), 10);
}

#[test]
fn test_invalid_sample_is_rejected() {
    match load_and_validate_config("configs/invalid.yaml") {
        Err(ConfigError::Invalid(errors)) => {
            assert!(errors.contains(&ValidationError::ZeroWorkers {
                setting: "worker_pool.workers"
            }));
            assert!(errors.contains(&ValidationError::ZeroCapacity {
                setting: "worker_pool.queue_capacity"
            }));
        }
        other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
    }
}

/// Build a pool and a fan-out stage from the YAML config and run work through both
#[tokio::test]
async fn test_runtime_from_yaml() {
    let config = load_and_validate_config("configs/millrace.yaml").unwrap();
    let token = CancellationToken::new();

    let workers = RuntimeBuilder::fan_out_workers(&config);
    let mut squares = fan_out_fan_in(&token, generate(&token, 1..=6), workers, |x: u32| x * x)
        .collect()
        .await;
    squares.sort_unstable();
    assert_eq!(squares, vec![1, 4, 9, 16, 25, 36]);

    let pool = RuntimeBuilder::worker_pool(&config, &token);
    assert_eq!(pool.workers(), 3);
    for _ in 0..5 {
        pool.submit(async {}).await.unwrap();
    }
    pool.close().await;
    assert_eq!(pool.completed(), 5);
}
