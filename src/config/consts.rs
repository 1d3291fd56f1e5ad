// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Buffer between adjacent pipeline tasks (one value in flight per hop)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// Publishes buffered ahead of the broadcaster dispatcher
pub const DEFAULT_INBOX_CAPACITY: usize = 10;
/// Per-subscriber outbox size; a full outbox drops values for that subscriber
pub const DEFAULT_OUTBOX_CAPACITY: usize = 10;

/// Jobs queued in a worker pool before `submit` starts to wait
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
/// Worker count when the host parallelism cannot be determined
pub const FALLBACK_WORKERS: usize = 4;

/// Token bucket size
pub const DEFAULT_BUCKET_CAPACITY: usize = 3;
/// One token is added back per period (100 milliseconds)
pub const DEFAULT_REFILL_PERIOD_MS: u64 = 100;
