// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::consts::DEFAULT_CHANNEL_CAPACITY;
use crate::observability::messages::stream::{TaskStarted, TaskStopped, TeeOutputDropped};
use crate::observability::messages::StructuredLog;
use crate::streams::{offer, Offer, Source, StopReason};

/// Split `src` into two sources that each receive every value.
///
/// Each value is handed to the first output and then the second; the relay
/// does not read the next value until both offers were accepted, so the
/// slower consumer sets the pace. Both outputs close together when the relay
/// exits.
///
/// If one output is dropped, the relay keeps feeding the other and exits once
/// both are gone, even while the upstream is silent.
pub fn tee<T>(token: &CancellationToken, src: Source<T>) -> (Source<T>, Source<T>)
where
    T: Clone + Send + 'static,
{
    let (first_tx, first) = Source::channel(DEFAULT_CHANNEL_CAPACITY);
    let (second_tx, second) = Source::channel(DEFAULT_CHANNEL_CAPACITY);
    tokio::spawn(run_tee(token.clone(), src, [Some(first_tx), Some(second_tx)]));
    (first, second)
}

async fn run_tee<T>(
    token: CancellationToken,
    mut src: Source<T>,
    mut outputs: [Option<mpsc::Sender<T>>; 2],
) where
    T: Clone + Send,
{
    TaskStarted {
        task: "tee",
        capacity: DEFAULT_CHANNEL_CAPACITY,
    }
    .log();

    let mut forwarded = 0usize;
    let reason = 'relay: loop {
        if outputs.iter().all(Option::is_none) {
            break StopReason::DownstreamDropped;
        }

        let value = tokio::select! {
            biased;
            _ = token.cancelled() => break StopReason::Cancelled,
            _ = all_closed(&outputs) => break StopReason::DownstreamDropped,
            next = src.next() => match next {
                Some(value) => value,
                None => break StopReason::Exhausted,
            },
        };

        for (index, slot) in outputs.iter_mut().enumerate() {
            let offered = match slot.as_ref() {
                Some(tx) => offer(&token, tx, value.clone()).await,
                None => continue,
            };

            match offered {
                Offer::Accepted => {}
                Offer::Cancelled => break 'relay StopReason::Cancelled,
                Offer::Dropped => {
                    TeeOutputDropped { output: index + 1 }.log();
                    *slot = None;
                }
            }
        }
        forwarded += 1;
    };

    TaskStopped {
        task: "tee",
        forwarded,
        reason,
    }
    .log();
}

/// Resolves once every output still held has lost its consumer.
async fn all_closed<T>(outputs: &[Option<mpsc::Sender<T>>; 2]) {
    for tx in outputs.iter().flatten() {
        tx.closed().await;
    }
}
