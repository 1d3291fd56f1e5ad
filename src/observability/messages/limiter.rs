// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for rate limiter lifecycle.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Rate limiter created with a full bucket.
///
/// # Log Level
/// `info!` - Important operational event
pub struct LimiterStarted {
    pub capacity: usize,
    pub refill_period: Duration,
}

impl Display for LimiterStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rate limiter started: capacity={}, refill one token every {:?}",
            self.capacity, self.refill_period
        )
    }
}

impl StructuredLog for LimiterStarted {
    fn log(&self) {
        tracing::info!(
            capacity = self.capacity,
            refill_period_ms = self.refill_period.as_millis() as u64,
            "{}", self
        );
    }
}

/// Refill task stopped; tokens left in the bucket remain consumable.
///
/// # Log Level
/// `debug!` - Lifecycle detail
pub struct RefillStopped {
    pub available: usize,
    pub refills: u64,
}

impl Display for RefillStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Rate limiter refill stopped after {} refills: {} tokens left",
            self.refills, self.available
        )
    }
}

impl StructuredLog for RefillStopped {
    fn log(&self) {
        tracing::debug!(available = self.available, refills = self.refills, "{}", self);
    }
}
