// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

/// The "pull next value or learn the sequence ended" contract.
///
/// Every stream primitive consumes and produces values through this trait.
/// `None` is the definite end signal: once returned, later calls keep
/// returning `None` without blocking.
#[async_trait]
pub trait Pull<T: Send>: Send {
    /// Wait for the next value, or `None` once the producer has closed.
    async fn next(&mut self) -> Option<T>;
}
