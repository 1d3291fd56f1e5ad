// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded worker pool.
//!
//! A fixed set of workers dequeue jobs from one bounded queue. `submit` waits
//! while the queue is full, which is where backpressure reaches the caller.
//! Each job runs on its own task that the worker awaits, so at most `workers`
//! jobs run at once and a panicking job costs the pool nothing but that job.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::consts::DEFAULT_QUEUE_CAPACITY;
use crate::config::default_workers;
use crate::errors::PoolError;
use crate::observability::messages::pool::{JobPanicked, PoolClosed, PoolStarted, WorkerExited};
use crate::observability::messages::StructuredLog;

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug, Clone, Copy)]
pub struct PoolOptions {
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

pub struct WorkerPool {
    queue: Mutex<Option<mpsc::Sender<Job>>>,
    workers: tokio::sync::Mutex<JoinSet<()>>,
    token: CancellationToken,
    completed: Arc<AtomicU64>,
    worker_count: usize,
}

impl WorkerPool {
    /// Start the workers. Zero workers or a zero queue capacity are raised
    /// to 1.
    ///
    /// Cancelling `token` makes workers stop dequeuing; jobs still queued are
    /// dropped without running and a job already running is allowed to finish.
    pub fn new(token: &CancellationToken, options: PoolOptions) -> Self {
        let worker_count = options.workers.max(1);
        let queue_capacity = options.queue_capacity.max(1);

        let started = PoolStarted {
            workers: worker_count,
            queue_capacity,
        };
        started.log();
        let span = started.span("workers");

        let (tx, rx) = mpsc::channel::<Job>(queue_capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let completed = Arc::new(AtomicU64::new(0));

        let mut workers = JoinSet::new();
        for worker in 0..worker_count {
            let worker_loop = work(worker, token.clone(), Arc::clone(&rx), Arc::clone(&completed));
            workers.spawn(worker_loop.instrument(span.clone()));
        }

        Self {
            queue: Mutex::new(Some(tx)),
            workers: tokio::sync::Mutex::new(workers),
            token: token.clone(),
            completed,
            worker_count,
        }
    }

    /// Queue `job`, waiting while the queue is full.
    ///
    /// # Errors
    /// * `PoolError::Closed` - `close` was called
    /// * `PoolError::Cancelled` - the pool's token fired before the job was queued
    pub async fn submit<F>(&self, job: F) -> Result<(), PoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tx = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(PoolError::Closed)?;

        if self.token.is_cancelled() {
            return Err(PoolError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(PoolError::Cancelled),
            sent = tx.send(Box::pin(job)) => sent.map_err(|_| PoolError::Closed),
        }
    }

    /// Stop accepting jobs, run everything already queued, and wait for every
    /// worker to exit. Calling it again waits for the same shutdown.
    pub async fn close(&self) {
        let start = Instant::now();
        let first = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();

        let mut workers = self.workers.lock().await;
        while workers.join_next().await.is_some() {}

        if first {
            PoolClosed {
                completed: self.completed(),
                duration: start.elapsed(),
            }
            .log();
        }
    }

    /// Jobs that ran to completion or panicked.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    pub fn workers(&self) -> usize {
        self.worker_count
    }
}

async fn work(
    worker: usize,
    token: CancellationToken,
    queue: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>,
    completed: Arc<AtomicU64>,
) {
    let mut jobs = 0usize;
    let cancelled = loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => break true,
            job = async { queue.lock().await.recv().await } => job,
        };

        let Some(job) = next else {
            break false;
        };

        if let Err(e) = tokio::spawn(job).await {
            JobPanicked { worker, error: &e }.log();
        }
        jobs += 1;
        completed.fetch_add(1, Ordering::AcqRel);
    };

    WorkerExited {
        worker,
        jobs,
        cancelled,
    }
    .log();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn options(workers: usize, queue_capacity: usize) -> PoolOptions {
        PoolOptions {
            workers,
            queue_capacity,
        }
    }

    #[tokio::test]
    async fn test_every_job_runs_exactly_once() {
        let token = CancellationToken::new();
        let pool = WorkerPool::new(&token, options(3, 4));
        let runs: Arc<Vec<AtomicUsize>> = Arc::new((0..25).map(|_| AtomicUsize::new(0)).collect());

        for i in 0..25 {
            let runs = Arc::clone(&runs);
            pool.submit(async move {
                runs[i].fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }
        pool.close().await;

        assert!(runs.iter().all(|r| r.load(Ordering::SeqCst) == 1));
        assert_eq!(pool.completed(), 25);
    }

    #[tokio::test]
    async fn test_close_waits_for_queued_jobs() {
        let token = CancellationToken::new();
        let pool = WorkerPool::new(&token, options(2, 10));
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let finished = Arc::clone(&finished);
            pool.submit(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        pool.close().await;
        assert_eq!(finished.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_never_exceeds_workers() {
        let token = CancellationToken::new();
        let pool = WorkerPool::new(&token, options(3, 20));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..15 {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            pool.submit(async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        pool.close().await;
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_worker_survives_panicking_job() {
        let token = CancellationToken::new();
        let pool = WorkerPool::new(&token, options(1, 4));
        let ran = Arc::new(AtomicUsize::new(0));

        pool.submit(async { panic!("job failure") }).await.unwrap();
        let after = Arc::clone(&ran);
        pool.submit(async move {
            after.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

        pool.close().await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(pool.completed(), 2);
    }

    #[tokio::test]
    async fn test_submit_after_close_is_rejected_and_close_is_idempotent() {
        let token = CancellationToken::new();
        let pool = WorkerPool::new(&token, options(2, 2));
        pool.close().await;
        pool.close().await;

        assert_eq!(pool.submit(async {}).await, Err(PoolError::Closed));
    }

    #[tokio::test]
    async fn test_full_queue_applies_backpressure() {
        let token = CancellationToken::new();
        let pool = WorkerPool::new(&token, options(1, 1));
        let (release, gate) = oneshot::channel::<()>();

        // Occupies the only worker until released
        pool.submit(async move {
            let _ = gate.await;
        })
        .await
        .unwrap();
        // Fills the queue once the worker has taken the first job
        pool.submit(async {}).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), pool.submit(async {})).await;
        assert!(blocked.is_err(), "submit returned while the queue was full");

        release.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), pool.submit(async {}))
            .await
            .expect("submit still blocked after the queue drained")
            .unwrap();
        pool.close().await;
        assert_eq!(pool.completed(), 3);
    }

    #[tokio::test]
    async fn test_cancellation_stops_workers_and_submissions() {
        let token = CancellationToken::new();
        let pool = WorkerPool::new(&token, options(2, 8));
        token.cancel();

        assert_eq!(pool.submit(async {}).await, Err(PoolError::Cancelled));
        tokio::time::timeout(Duration::from_secs(1), pool.close())
            .await
            .expect("workers did not exit after cancellation");
    }

    #[test]
    fn test_default_options() {
        let defaults = PoolOptions::default();
        assert_eq!(defaults.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(defaults.workers >= 1);
    }
}
