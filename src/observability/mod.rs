// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic line the toolkit emits is a message struct from
//! [`messages`], rendered through `Display` and logged with structured
//! fields via [`messages::StructuredLog`]. Keeping messages in one place:
//!
//! * removes magic strings from the concurrency code
//! * keeps field names consistent across subsystems
//! * lets a subscriber filter by target and field
//!
//! # Usage
//!
//! ```rust
//! use the_millrace::observability::messages::StructuredLog;
//! use the_millrace::observability::messages::pool::PoolStarted;
//!
//! let msg = PoolStarted {
//!     workers: 4,
//!     queue_capacity: 100,
//! };
//!
//! msg.log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"info"` or `"the_millrace=debug"`).
///
/// Safe to call more than once; later calls are ignored. Returns `true` if
/// this call installed the subscriber.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
