// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for stream task lifecycle events.
//!
//! Covers the producer and relay tasks spawned by `streams`:
//! * task start and stop, with the reason the task stopped
//! * fan-in join barrier release
//! * a tee output being abandoned by its consumer

use crate::observability::messages::StructuredLog;
use crate::streams::StopReason;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A stream task was spawned.
///
/// # Log Level
/// `debug!` - Per-task lifecycle detail
///
/// # Example
/// ```
/// use the_millrace::observability::messages::stream::TaskStarted;
///
/// let msg = TaskStarted {
///     task: "transform",
///     capacity: 1,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct TaskStarted<'a> {
    pub task: &'a str,
    pub capacity: usize,
}

impl Display for TaskStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stream task '{}' started: output_capacity={}",
            self.task, self.capacity
        )
    }
}

impl StructuredLog for TaskStarted<'_> {
    fn log(&self) {
        tracing::debug!(task = self.task, capacity = self.capacity, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stream_task",
            span_name = name,
            task = self.task,
            capacity = self.capacity,
        )
    }
}

/// A stream task exited and closed its output.
///
/// # Log Level
/// `debug!` - Per-task lifecycle detail
///
/// # Example
/// ```
/// use the_millrace::observability::messages::stream::TaskStopped;
/// use the_millrace::streams::StopReason;
///
/// let msg = TaskStopped {
///     task: "generate",
///     forwarded: 5,
///     reason: StopReason::Exhausted,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct TaskStopped<'a> {
    pub task: &'a str,
    pub forwarded: usize,
    pub reason: StopReason,
}

impl Display for TaskStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stream task '{}' stopped after {} values: {}",
            self.task, self.forwarded, self.reason
        )
    }
}

impl StructuredLog for TaskStopped<'_> {
    fn log(&self) {
        tracing::debug!(
            task = self.task,
            forwarded = self.forwarded,
            reason = self.reason.as_str(),
            "{}", self
        );
    }
}

/// All fan-in forwarders exited; the merged source is being closed.
///
/// # Log Level
/// `debug!` - Per-task lifecycle detail
pub struct BarrierReleased {
    pub forwarders: usize,
}

impl Display for BarrierReleased {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fan-in barrier released: {} forwarders exited, closing merged output",
            self.forwarders
        )
    }
}

impl StructuredLog for BarrierReleased {
    fn log(&self) {
        tracing::debug!(forwarders = self.forwarders, "{}", self);
    }
}

/// A fan-in forwarder task panicked instead of exiting cleanly.
///
/// # Log Level
/// `warn!` - Unexpected but recovered
pub struct ForwarderPanicked<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for ForwarderPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Fan-in forwarder exited abnormally: {}", self.error)
    }
}

impl StructuredLog for ForwarderPanicked<'_> {
    fn log(&self) {
        tracing::warn!(error = %self.error, "{}", self);
    }
}

/// One side of a tee was dropped by its consumer; the other keeps flowing.
///
/// # Log Level
/// `debug!` - Per-task lifecycle detail
pub struct TeeOutputDropped {
    pub output: usize,
}

impl Display for TeeOutputDropped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Tee output {} was dropped by its consumer; continuing with the other",
            self.output
        )
    }
}

impl StructuredLog for TeeOutputDropped {
    fn log(&self) {
        tracing::debug!(output = self.output, "{}", self);
    }
}
