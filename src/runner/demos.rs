// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};

use anyhow::{ensure, Context};
use tokio_util::sync::CancellationToken;

use crate::cancel::{cancel_after, with_deadline};
use crate::config::{Config, RuntimeBuilder};
use crate::runner::{Demo, DemoFuture};
use crate::streams::{
    bridge, fan_out_fan_in, generate, generate_with_capacity, tee, transform,
    transform_with_capacity, Source,
};

/// Every demo, in the order `all` runs them.
pub fn all() -> Vec<Demo> {
    vec![
        Demo {
            name: "pipeline",
            description: "generate -> transform -> collect, order preserved",
            run: pipeline,
        },
        Demo {
            name: "fan",
            description: "fan-out over several workers, fan-in through a join barrier",
            run: fan,
        },
        Demo {
            name: "tee",
            description: "one source split into two independent stages",
            run: tee_split,
        },
        Demo {
            name: "bridge",
            description: "a source of sources flattened depth first",
            run: flatten,
        },
        Demo {
            name: "broadcast",
            description: "best-effort publish to every subscriber",
            run: broadcast,
        },
        Demo {
            name: "pool",
            description: "bounded worker pool drained on close",
            run: pool,
        },
        Demo {
            name: "limiter",
            description: "token bucket: a burst, then one token per period",
            run: limiter,
        },
        Demo {
            name: "timeout",
            description: "deadlines layered on top as token cancellation",
            run: timeout,
        },
    ]
}

/// generate -> transform with every hop buffered to `pipeline.channel_capacity`.
fn doubling_pipeline(
    config: &Config,
    token: &CancellationToken,
    values: Vec<i32>,
) -> Source<i32> {
    let capacity = RuntimeBuilder::channel_capacity(config);
    let numbers = generate_with_capacity(token, values, capacity);
    transform_with_capacity(token, numbers, |x: i32| x * 2, capacity)
}

fn pipeline(config: Config, token: CancellationToken) -> DemoFuture {
    Box::pin(async move {
        let doubled = doubling_pipeline(&config, &token, vec![1, 2, 3, 4, 5])
            .collect()
            .await;
        println!(
            "doubled with {}-slot hops: {:?}",
            RuntimeBuilder::channel_capacity(&config),
            doubled
        );
        ensure!(doubled == vec![2, 4, 6, 8, 10], "unexpected pipeline output {:?}", doubled);
        Ok(())
    })
}

fn fan(config: Config, token: CancellationToken) -> DemoFuture {
    Box::pin(async move {
        let workers = RuntimeBuilder::fan_out_workers(&config);
        let mut squares = fan_out_fan_in(&token, generate(&token, 1..=5), workers, |x: u64| x * x)
            .collect()
            .await;
        println!("squares from {} workers (arrival order): {:?}", workers, squares);

        squares.sort_unstable();
        ensure!(squares == vec![1, 4, 9, 16, 25], "unexpected squares {:?}", squares);
        Ok(())
    })
}

fn tee_split(_: Config, token: CancellationToken) -> DemoFuture {
    Box::pin(async move {
        let (left, right) = tee(&token, generate(&token, 1..=5));
        let labels = transform(&token, left, |x: i32| format!("item-{}", x));
        let negated = transform(&token, right, |x: i32| -x);

        let (labels, negated) = tokio::join!(labels.collect(), negated.collect());
        println!("left:  {:?}", labels);
        println!("right: {:?}", negated);
        ensure!(labels.len() == negated.len(), "tee outputs diverged");
        Ok(())
    })
}

fn flatten(_: Config, token: CancellationToken) -> DemoFuture {
    Box::pin(async move {
        let batches: Vec<Source<&'static str>> = vec![
            generate(&token, ["a1", "a2"]),
            generate(&token, ["b1"]),
            generate(&token, ["c1", "c2", "c3"]),
        ];
        let flat = bridge(&token, generate(&token, batches)).collect().await;
        println!("flattened: {:?}", flat);
        ensure!(flat.len() == 6, "bridge lost values: {:?}", flat);
        Ok(())
    })
}

fn broadcast(config: Config, token: CancellationToken) -> DemoFuture {
    Box::pin(async move {
        let hub = RuntimeBuilder::broadcaster::<String>(&config, &token);
        let events = ["started", "progress", "finished"];

        let mut readers = Vec::new();
        for reader in 0..2 {
            let mut sub = hub.subscribe().context("broadcaster refused a subscriber")?;
            let expected = events.len();
            readers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while seen.len() < expected {
                    match sub.recv().await {
                        Some(event) => seen.push(event),
                        None => break,
                    }
                }
                println!("subscriber {} saw {:?}", reader, seen);
                seen.len()
            }));
        }

        for event in events {
            hub.publish(event.to_string()).await;
        }

        for reader in readers {
            let seen = reader.await.context("subscriber task failed")?;
            ensure!(seen == events.len(), "subscriber missed events");
        }

        hub.close();
        hub.closed().await;
        println!("broadcaster state: {:?}", hub.state());
        let late = hub.publish("late".to_string()).await;
        ensure!(!late, "closed broadcaster accepted a publish");
        Ok(())
    })
}

fn pool(config: Config, token: CancellationToken) -> DemoFuture {
    Box::pin(async move {
        let pool = RuntimeBuilder::worker_pool(&config, &token);
        println!("pool with {} workers", pool.workers());

        for job in 0..6u64 {
            pool.submit(async move {
                tokio::time::sleep(Duration::from_millis(20 + job * 5)).await;
                println!("job {} done", job);
            })
            .await?;
        }

        pool.close().await;
        println!("completed {} jobs", pool.completed());
        ensure!(pool.completed() == 6, "pool lost jobs");
        Ok(())
    })
}

fn limiter(config: Config, token: CancellationToken) -> DemoFuture {
    Box::pin(async move {
        let limiter = RuntimeBuilder::rate_limiter(&config, &token);
        let start = Instant::now();

        let burst = (0..limiter.capacity() + 2).filter(|_| limiter.allow()).count();
        println!("burst: {} of {} requests allowed", burst, limiter.capacity() + 2);

        for request in 0..2 {
            ensure!(limiter.wait().await, "limiter wait cancelled");
            println!("request {} admitted at {:?}", request, start.elapsed());
        }

        limiter.close();
        ensure!(burst == limiter.capacity(), "burst exceeded bucket capacity");
        Ok(())
    })
}

fn timeout(_: Config, token: CancellationToken) -> DemoFuture {
    Box::pin(async move {
        let slow = tokio::time::sleep(Duration::from_millis(200));
        let outcome = with_deadline(&token, Duration::from_millis(50), slow).await;
        println!("slow operation finished within deadline: {}", outcome.is_some());
        ensure!(outcome.is_none(), "deadline did not fire");

        let deadline = token.child_token();
        let timer = cancel_after(&deadline, Duration::from_millis(30));
        let mut counter = transform(&deadline, generate(&deadline, 0..u64::MAX), |x| x);
        let mut counted = 0usize;
        while counter.next().await.is_some() {
            counted += 1;
        }
        timer.await.context("deadline timer failed")?;
        println!("pipeline emitted {} values before its deadline", counted);
        Ok(())
    })
}
