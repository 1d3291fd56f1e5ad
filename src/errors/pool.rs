// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Reasons a job could not be handed to a [`crate::pool::WorkerPool`].
///
/// Neither case is a job failure; the job was never queued.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// `close` was already called on the pool.
    #[error("worker pool is closed")]
    Closed,

    /// The pool's cancellation token fired while waiting for queue space.
    #[error("worker pool was cancelled")]
    Cancelled,
}
