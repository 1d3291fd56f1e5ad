// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod broadcast;     // best-effort publish/subscribe
pub mod cancel;        // cancellation tokens and deadlines
pub mod config;        // config loading + runtime builder
pub mod errors;        // error handling
pub mod limiter;       // token-bucket rate limiter
pub mod observability;
pub mod pool;          // bounded worker pool
pub mod runner;        // named demos
pub mod streams;       // sources and pipeline stages
pub mod traits;        // unified abstractions
