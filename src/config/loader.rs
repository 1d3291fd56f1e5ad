// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_BUCKET_CAPACITY, DEFAULT_CHANNEL_CAPACITY, DEFAULT_INBOX_CAPACITY,
    DEFAULT_OUTBOX_CAPACITY, DEFAULT_QUEUE_CAPACITY, DEFAULT_REFILL_PERIOD_MS, FALLBACK_WORKERS,
};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for pipelines and coordination primitives.
///
/// Every section is optional; unset knobs fall back to the constants in
/// [`crate::config::consts`] through the section getters.
///
/// # Example
/// ```yaml
/// pipeline:
///   channel_capacity: 1
///   fan_out_workers: 3
/// broadcast:
///   inbox_capacity: 10
///   outbox_capacity: 10
/// worker_pool:
///   workers: 3
///   queue_capacity: 100
/// rate_limiter:
///   capacity: 3
///   refill_period_ms: 100
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub worker_pool: WorkerPoolConfig,
    #[serde(default)]
    pub rate_limiter: RateLimiterConfig,
}

/// Stream stage settings.
///
/// # Fields
/// * `channel_capacity` - Buffer between adjacent stages (defaults to 1)
/// * `fan_out_workers` - Parallel stages for fan-out (defaults to host parallelism)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PipelineConfig {
    pub channel_capacity: Option<usize>,
    pub fan_out_workers: Option<usize>,
}

impl PipelineConfig {
    pub fn get_channel_capacity(&self) -> usize {
        self.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn get_fan_out_workers(&self) -> usize {
        self.fan_out_workers.unwrap_or_else(default_workers)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct BroadcastConfig {
    pub inbox_capacity: Option<usize>,
    pub outbox_capacity: Option<usize>,
}

impl BroadcastConfig {
    pub fn get_inbox_capacity(&self) -> usize {
        self.inbox_capacity.unwrap_or(DEFAULT_INBOX_CAPACITY)
    }

    pub fn get_outbox_capacity(&self) -> usize {
        self.outbox_capacity.unwrap_or(DEFAULT_OUTBOX_CAPACITY)
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct WorkerPoolConfig {
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
}

impl WorkerPoolConfig {
    pub fn get_workers(&self) -> usize {
        self.workers.unwrap_or_else(default_workers)
    }

    pub fn get_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }
}

/// Token bucket settings.
///
/// # Fields
/// * `capacity` - Maximum tokens held (defaults to 3)
/// * `refill_period_ms` - Milliseconds between single-token refills (defaults to 100)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RateLimiterConfig {
    pub capacity: Option<usize>,
    pub refill_period_ms: Option<u64>,
}

impl RateLimiterConfig {
    pub fn get_capacity(&self) -> usize {
        self.capacity.unwrap_or(DEFAULT_BUCKET_CAPACITY)
    }

    pub fn get_refill_period(&self) -> Duration {
        Duration::from_millis(self.refill_period_ms.unwrap_or(DEFAULT_REFILL_PERIOD_MS))
    }
}

/// Worker count matching the host's available parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_WORKERS)
}

/// Load a config from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => {
            let content = fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&content)?)
        }
        "toml" => {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        }
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Load a config and reject settings that cannot build a working runtime.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
