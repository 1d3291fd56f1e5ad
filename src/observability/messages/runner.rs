// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the demo runner.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A demo is about to run.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DemoStarted<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

impl Display for DemoStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Running demo '{}': {}", self.name, self.description)
    }
}

impl StructuredLog for DemoStarted<'_> {
    fn log(&self) {
        tracing::info!(demo = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("demo", span_name = name, demo = self.name)
    }
}

/// A demo finished.
///
/// # Log Level
/// `info!` on success, `error!` on failure
pub struct DemoCompleted<'a> {
    pub name: &'a str,
    pub duration: std::time::Duration,
    pub error: Option<&'a anyhow::Error>,
}

impl Display for DemoCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.error {
            None => write!(f, "Demo '{}' completed in {:?}", self.name, self.duration),
            Some(e) => write!(
                f,
                "Demo '{}' failed after {:?}: {:#}",
                self.name, self.duration, e
            ),
        }
    }
}

impl StructuredLog for DemoCompleted<'_> {
    fn log(&self) {
        let duration_ms = self.duration.as_millis() as u64;
        match self.error {
            None => tracing::info!(demo = self.name, duration_ms, "{}", self),
            Some(_) => tracing::error!(demo = self.name, duration_ms, "{}", self),
        }
    }
}
