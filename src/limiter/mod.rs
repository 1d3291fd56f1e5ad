// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Token-bucket rate limiter.
//!
//! Tokens are semaphore permits. The bucket starts full and a background task
//! adds one permit per refill period while the bucket is below capacity, so
//! the number of tokens stays within `[0, capacity]`. Ticks that find the
//! bucket full are no-ops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::consts::{DEFAULT_BUCKET_CAPACITY, DEFAULT_REFILL_PERIOD_MS};
use crate::observability::messages::limiter::{LimiterStarted, RefillStopped};
use crate::observability::messages::StructuredLog;

#[derive(Debug, Clone, Copy)]
pub struct RateLimiterOptions {
    pub capacity: usize,
    pub refill_period: Duration,
}

impl Default for RateLimiterOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUCKET_CAPACITY,
            refill_period: Duration::from_millis(DEFAULT_REFILL_PERIOD_MS),
        }
    }
}

pub struct RateLimiter {
    tokens: Arc<Semaphore>,
    capacity: usize,
    token: CancellationToken,
    refill: CancellationToken,
    stopped: CancellationToken,
}

impl RateLimiter {
    /// Create a full bucket and start refilling it.
    ///
    /// `token` bounds [`wait`](Self::wait) and, through a child token, the
    /// refill task. A zero capacity is raised to 1; a zero period is treated
    /// as one millisecond.
    pub fn new(token: &CancellationToken, options: RateLimiterOptions) -> Self {
        let capacity = options.capacity.max(1);
        let period = options.refill_period.max(Duration::from_millis(1));

        LimiterStarted {
            capacity,
            refill_period: period,
        }
        .log();

        let tokens = Arc::new(Semaphore::new(capacity));
        let refill = token.child_token();
        let stopped = CancellationToken::new();
        tokio::spawn(run_refill(
            refill.clone(),
            stopped.clone(),
            Arc::clone(&tokens),
            capacity,
            period,
        ));

        Self {
            tokens,
            capacity,
            token: token.clone(),
            refill,
            stopped,
        }
    }

    /// Take a token if one is available. Never waits.
    pub fn allow(&self) -> bool {
        match self.tokens.try_acquire() {
            Ok(permit) => {
                permit.forget();
                true
            }
            Err(_) => false,
        }
    }

    /// Wait for a token. Returns `false` if the limiter's token is cancelled
    /// first.
    ///
    /// There is no timeout; after [`close`](Self::close) an empty bucket is
    /// never refilled, so bound the wait with a cancellation deadline such as
    /// [`crate::cancel::with_deadline`].
    pub async fn wait(&self) -> bool {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            acquired = self.tokens.acquire() => match acquired {
                Ok(permit) => {
                    permit.forget();
                    true
                }
                Err(_) => false,
            },
        }
    }

    /// Stop refilling. Tokens already in the bucket stay available.
    pub fn close(&self) {
        self.refill.cancel();
    }

    /// Resolves once the refill task has exited, after [`close`](Self::close)
    /// or cancellation of the limiter's token.
    pub async fn closed(&self) {
        self.stopped.cancelled().await;
    }

    pub fn available(&self) -> usize {
        self.tokens.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

async fn run_refill(
    token: CancellationToken,
    stopped: CancellationToken,
    tokens: Arc<Semaphore>,
    capacity: usize,
    period: Duration,
) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut refills = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticks.tick() => {
                // Only this task adds permits, so the check cannot go stale upward
                if tokens.available_permits() < capacity {
                    tokens.add_permits(1);
                    refills += 1;
                }
            }
        }
    }

    RefillStopped {
        available: tokens.available_permits(),
        refills,
    }
    .log();
    stopped.cancel();
}
