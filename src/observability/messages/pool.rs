// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for worker pool lifecycle and job recovery.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Worker pool started its workers.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_millrace::observability::messages::pool::PoolStarted;
///
/// let msg = PoolStarted {
///     workers: 3,
///     queue_capacity: 100,
/// };
///
/// assert_eq!(msg.to_string(), "Worker pool started: workers=3, queue_capacity=100");
/// ```
pub struct PoolStarted {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Display for PoolStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker pool started: workers={}, queue_capacity={}",
            self.workers, self.queue_capacity
        )
    }
}

impl StructuredLog for PoolStarted {
    fn log(&self) {
        tracing::info!(
            workers = self.workers,
            queue_capacity = self.queue_capacity,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "worker_pool",
            span_name = name,
            workers = self.workers,
            queue_capacity = self.queue_capacity,
        )
    }
}

/// A job panicked; the worker recovered and keeps dequeuing.
///
/// # Log Level
/// `warn!` - Job failure, pool unaffected
pub struct JobPanicked<'a> {
    pub worker: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for JobPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker {} recovered from a failed job: {}",
            self.worker, self.error
        )
    }
}

impl StructuredLog for JobPanicked<'_> {
    fn log(&self) {
        tracing::warn!(worker = self.worker, error = %self.error, "{}", self);
    }
}

/// A worker left its loop.
///
/// # Log Level
/// `debug!` - Per-worker lifecycle detail
pub struct WorkerExited {
    pub worker: usize,
    pub jobs: usize,
    pub cancelled: bool,
}

impl Display for WorkerExited {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let why = if self.cancelled { "cancelled" } else { "queue drained" };
        write!(
            f,
            "Worker {} exited after {} jobs: {}",
            self.worker, self.jobs, why
        )
    }
}

impl StructuredLog for WorkerExited {
    fn log(&self) {
        tracing::debug!(
            worker = self.worker,
            jobs = self.jobs,
            cancelled = self.cancelled,
            "{}", self
        );
    }
}

/// Pool close finished: queue drained and every worker joined.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PoolClosed {
    pub completed: u64,
    pub duration: std::time::Duration,
}

impl Display for PoolClosed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Worker pool closed: {} jobs completed, drained in {:?}",
            self.completed, self.duration
        )
    }
}

impl StructuredLog for PoolClosed {
    fn log(&self) {
        tracing::info!(
            completed = self.completed,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}
