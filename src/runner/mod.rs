// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Named, runnable demos of the toolkit.
//!
//! A [`Runner`] holds a registry of [`Demo`]s, runs them by name or all in
//! order, and times each run. Every demo gets a child of the runner's token,
//! so cancelling the runner stops whatever demo is in flight.

pub mod demos;

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::Config;
use crate::observability::messages::runner::{DemoCompleted, DemoStarted};
use crate::observability::messages::StructuredLog;

pub type DemoFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// A runnable demo.
#[derive(Clone, Copy)]
pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub run: fn(Config, CancellationToken) -> DemoFuture,
}

pub struct Runner {
    demos: Vec<Demo>,
    config: Config,
    token: CancellationToken,
}

impl Runner {
    pub fn new(config: Config, token: CancellationToken) -> Self {
        Self {
            demos: Vec::new(),
            config,
            token,
        }
    }

    /// Runner preloaded with every demo in [`demos::all`].
    pub fn with_all_demos(config: Config, token: CancellationToken) -> Self {
        let mut runner = Self::new(config, token);
        for demo in demos::all() {
            runner.register(demo);
        }
        runner
    }

    /// Add a demo. A later registration under the same name replaces the
    /// earlier one in place.
    pub fn register(&mut self, demo: Demo) {
        match self.demos.iter_mut().find(|d| d.name == demo.name) {
            Some(existing) => *existing = demo,
            None => self.demos.push(demo),
        }
    }

    /// Registered demos, in registration order.
    pub fn list(&self) -> &[Demo] {
        &self.demos
    }

    /// Run one demo by name.
    pub async fn run(&self, name: &str) -> Result<()> {
        let demo = self
            .demos
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| anyhow!("unknown demo '{}'", name))?;
        self.run_demo(demo).await
    }

    /// Run every demo in order. A failing demo does not stop the others; the
    /// returned error counts the failures.
    pub async fn run_all(&self) -> Result<()> {
        let mut failed = 0usize;
        for demo in &self.demos {
            if self.token.is_cancelled() {
                bail!("cancelled before demo '{}'", demo.name);
            }
            if self.run_demo(demo).await.is_err() {
                failed += 1;
            }
        }

        if failed > 0 {
            bail!("{} of {} demos failed", failed, self.demos.len());
        }
        Ok(())
    }

    async fn run_demo(&self, demo: &Demo) -> Result<()> {
        let started = DemoStarted {
            name: demo.name,
            description: demo.description,
        };
        started.log();
        let span = started.span("demo_run");

        let start = Instant::now();
        let outcome = (demo.run)(self.config.clone(), self.token.child_token())
            .instrument(span)
            .await;

        DemoCompleted {
            name: demo.name,
            duration: start.elapsed(),
            error: outcome.as_ref().err(),
        }
        .log();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_demo(_: Config, _: CancellationToken) -> DemoFuture {
        Box::pin(async { Ok(()) })
    }

    fn failing_demo(_: Config, _: CancellationToken) -> DemoFuture {
        Box::pin(async { Err(anyhow!("boom")) })
    }

    fn runner() -> Runner {
        Runner::new(Config::default(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_run_by_name() {
        let mut runner = runner();
        runner.register(Demo {
            name: "ok",
            description: "always succeeds",
            run: ok_demo,
        });

        assert!(runner.run("ok").await.is_ok());
        let err = runner.run("missing").await.unwrap_err();
        assert!(err.to_string().contains("unknown demo 'missing'"));
    }

    #[tokio::test]
    async fn test_run_all_counts_failures() {
        let mut runner = runner();
        runner.register(Demo {
            name: "ok",
            description: "",
            run: ok_demo,
        });
        runner.register(Demo {
            name: "bad",
            description: "",
            run: failing_demo,
        });

        let err = runner.run_all().await.unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 demos failed");
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut runner = runner();
        runner.register(Demo {
            name: "x",
            description: "first",
            run: ok_demo,
        });
        runner.register(Demo {
            name: "y",
            description: "",
            run: ok_demo,
        });
        runner.register(Demo {
            name: "x",
            description: "second",
            run: failing_demo,
        });

        let names: Vec<_> = runner.list().iter().map(|d| (d.name, d.description)).collect();
        assert_eq!(names, vec![("x", "second"), ("y", "")]);
    }

    #[tokio::test]
    async fn test_run_all_stops_when_cancelled() {
        let token = CancellationToken::new();
        let mut runner = Runner::new(Config::default(), token.clone());
        runner.register(Demo {
            name: "ok",
            description: "",
            run: ok_demo,
        });
        token.cancel();

        assert!(runner.run_all().await.is_err());
    }
}
