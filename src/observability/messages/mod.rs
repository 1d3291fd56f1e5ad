// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `stream` - source, relay, stage, fan-in, tee and bridge task lifecycle
//! * `broadcast` - broadcaster dispatcher and subscriber events
//! * `pool` - worker pool lifecycle and job recovery
//! * `limiter` - rate limiter refill lifecycle
//! * `runner` - demo runner progress
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_millrace::observability::messages::StructuredLog;
//! use the_millrace::observability::messages::limiter::LimiterStarted;
//! use std::time::Duration;
//!
//! let msg = LimiterStarted {
//!     capacity: 3,
//!     refill_period: Duration::from_millis(100),
//! };
//!
//! tracing::info!("{}", msg);
//! msg.log();
//! ```

pub mod broadcast;
pub mod limiter;
pub mod pool;
pub mod runner;
pub mod stream;

use std::fmt::Display;
use tracing::Span;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog: Display {
    /// Emit the message as a single event at the message's level.
    fn log(&self);

    /// Open a span carrying the message's fields.
    ///
    /// Messages that mark the start of a long-lived task override this so the
    /// task's later events nest under it.
    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("millrace", span_name = name)
    }
}
