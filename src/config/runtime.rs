// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::broadcast::{BroadcastOptions, Broadcaster};
use crate::config::Config;
use crate::limiter::{RateLimiter, RateLimiterOptions};
use crate::pool::{PoolOptions, WorkerPool};
use tokio_util::sync::CancellationToken;

/// Builds configured primitives from a [`Config`].
///
/// Every builder takes the caller's cancellation token, so one token shuts
/// down everything built from the same configuration.
///
/// # Examples
///
/// ```
/// use the_millrace::cancel::CancellationToken;
/// use the_millrace::config::{Config, RuntimeBuilder};
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut config = Config::default();
/// config.worker_pool.workers = Some(2);
///
/// let token = CancellationToken::new();
/// let pool = RuntimeBuilder::worker_pool(&config, &token);
/// assert_eq!(pool.workers(), 2);
/// pool.close().await;
/// # }
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    pub fn pool_options(cfg: &Config) -> PoolOptions {
        PoolOptions {
            workers: cfg.worker_pool.get_workers(),
            queue_capacity: cfg.worker_pool.get_queue_capacity(),
        }
    }

    pub fn broadcast_options(cfg: &Config) -> BroadcastOptions {
        BroadcastOptions {
            inbox_capacity: cfg.broadcast.get_inbox_capacity(),
            outbox_capacity: cfg.broadcast.get_outbox_capacity(),
        }
    }

    pub fn rate_limiter_options(cfg: &Config) -> RateLimiterOptions {
        RateLimiterOptions {
            capacity: cfg.rate_limiter.get_capacity(),
            refill_period: cfg.rate_limiter.get_refill_period(),
        }
    }

    /// Start a worker pool sized by `worker_pool`.
    pub fn worker_pool(cfg: &Config, token: &CancellationToken) -> WorkerPool {
        WorkerPool::new(token, Self::pool_options(cfg))
    }

    /// Start a rate limiter per `rate_limiter`.
    pub fn rate_limiter(cfg: &Config, token: &CancellationToken) -> RateLimiter {
        RateLimiter::new(token, Self::rate_limiter_options(cfg))
    }

    /// Start a broadcaster per `broadcast`.
    pub fn broadcaster<T>(cfg: &Config, token: &CancellationToken) -> Broadcaster<T>
    where
        T: Clone + Send + 'static,
    {
        Broadcaster::new(token, Self::broadcast_options(cfg))
    }

    /// Worker count for fan-out stages.
    pub fn fan_out_workers(cfg: &Config) -> usize {
        cfg.pipeline.get_fan_out_workers()
    }

    /// Buffer size for explicitly sized stages.
    pub fn channel_capacity(cfg: &Config) -> usize {
        cfg.pipeline.get_channel_capacity()
    }
}
