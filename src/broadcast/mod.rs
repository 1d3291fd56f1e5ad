// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Best-effort publish/subscribe.
//!
//! A [`Broadcaster`] owns one dispatcher task. Publishers enqueue into a
//! bounded inbox; the dispatcher takes each value and offers a clone to every
//! subscriber registered at that moment with a non-blocking send. A full
//! subscriber outbox loses that value, and only that subscriber loses it.
//!
//! The dispatcher is the only writer of [`BroadcastState`]. On cancellation
//! (either [`Broadcaster::close`] or the caller's token) it moves to
//! `Closing`, stops accepting publishes, closes every outbox and finishes in
//! `Closed`.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::consts::{DEFAULT_INBOX_CAPACITY, DEFAULT_OUTBOX_CAPACITY};
use crate::observability::messages::broadcast::{
    BroadcasterClosed, BroadcasterStarted, DeliveryDropped, SubscriberAdded, SubscriberRemoved,
};
use crate::observability::messages::StructuredLog;
use crate::streams::Source;
use crate::traits::Pull;

/// Lifecycle of a [`Broadcaster`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastState {
    Running,
    Closing,
    Closed,
}

/// Identifier handed out by [`Broadcaster::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Display for SubscriberId {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BroadcastOptions {
    /// Publishes buffered ahead of the dispatcher.
    pub inbox_capacity: usize,
    /// Default per-subscriber outbox size used by [`Broadcaster::subscribe`].
    pub outbox_capacity: usize,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

/// Receiving end of one subscription.
pub struct Subscription<T> {
    id: SubscriberId,
    rx: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next delivered value, or `None` once the outbox was closed by
    /// unsubscribe or broadcaster shutdown.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Use the subscription as the head of a pipeline.
    pub fn into_source(self) -> Source<T> {
        Source::from_receiver(self.rx)
    }
}

#[async_trait]
impl<T: Send> Pull<T> for Subscription<T> {
    async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

struct Registry<T> {
    open: bool,
    outboxes: HashMap<SubscriberId, mpsc::Sender<T>>,
}

struct Shared<T> {
    registry: Mutex<Registry<T>>,
    next_id: AtomicU64,
    outbox_capacity: usize,
}

impl<T> Shared<T> {
    // A panic while holding the lock cannot leave the map half-updated
    fn registry(&self) -> MutexGuard<'_, Registry<T>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a running broadcaster. Clones share the same dispatcher.
pub struct Broadcaster<T> {
    shared: Arc<Shared<T>>,
    inbox: mpsc::Sender<T>,
    state: watch::Receiver<BroadcastState>,
    token: CancellationToken,
}

impl<T> Clone for Broadcaster<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            inbox: self.inbox.clone(),
            state: self.state.clone(),
            token: self.token.clone(),
        }
    }
}

impl<T> Broadcaster<T>
where
    T: Clone + Send + 'static,
{
    /// Spawn the dispatcher. The broadcaster closes when `token` is cancelled,
    /// when [`close`](Self::close) is called, or when every handle is dropped.
    pub fn new(token: &CancellationToken, options: BroadcastOptions) -> Self {
        let inbox_capacity = options.inbox_capacity.max(1);
        let outbox_capacity = options.outbox_capacity.max(1);

        let (inbox, rx) = mpsc::channel(inbox_capacity);
        let (state_tx, state) = watch::channel(BroadcastState::Running);
        let token = token.child_token();
        let shared = Arc::new(Shared {
            registry: Mutex::new(Registry {
                open: true,
                outboxes: HashMap::new(),
            }),
            next_id: AtomicU64::new(1),
            outbox_capacity,
        });

        let started = BroadcasterStarted {
            inbox_capacity,
            outbox_capacity,
        };
        started.log();
        let span = started.span("dispatcher");

        tokio::spawn(dispatch(token.clone(), rx, Arc::clone(&shared), state_tx).instrument(span));

        Self {
            shared,
            inbox,
            state,
            token,
        }
    }

    /// Register a subscriber with the default outbox capacity.
    pub fn subscribe(&self) -> Option<Subscription<T>> {
        self.subscribe_with_capacity(self.shared.outbox_capacity)
    }

    /// Register a subscriber with its own outbox capacity (raised to 1 if
    /// zero). Returns `None` unless the broadcaster is running.
    pub fn subscribe_with_capacity(&self, capacity: usize) -> Option<Subscription<T>> {
        let capacity = capacity.max(1);
        let mut registry = self.shared.registry();
        if !registry.open || self.token.is_cancelled() {
            return None;
        }

        let id = SubscriberId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(capacity);
        registry.outboxes.insert(id, tx);
        drop(registry);

        SubscriberAdded { id, capacity }.log();
        Some(Subscription { id, rx })
    }

    /// Remove a subscriber and close its outbox. Values already delivered
    /// stay readable. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.shared.registry().outboxes.remove(&id).is_some();
        if removed {
            SubscriberRemoved { id, explicit: true }.log();
        }
        removed
    }

    /// Hand `value` to the dispatcher, waiting for inbox space.
    ///
    /// Returns `false` and drops the value when the broadcaster is not running
    /// or shuts down while waiting.
    pub async fn publish(&self, value: T) -> bool {
        if !self.accepting() {
            return false;
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => false,
            sent = self.inbox.send(value) => sent.is_ok(),
        }
    }

    /// Like [`publish`](Self::publish) but never waits: a full inbox drops
    /// the value.
    pub fn try_publish(&self, value: T) -> bool {
        self.accepting() && self.inbox.try_send(value).is_ok()
    }

    /// Request shutdown. Idempotent and irreversible.
    pub fn close(&self) {
        self.token.cancel();
    }

    /// Wait until the dispatcher reached [`BroadcastState::Closed`].
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        // The dispatcher writes Closed before dropping its sender
        let _ = state.wait_for(|s| *s == BroadcastState::Closed).await;
    }

    pub fn state(&self) -> BroadcastState {
        *self.state.borrow()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.registry().outboxes.len()
    }

    fn accepting(&self) -> bool {
        !self.token.is_cancelled() && self.state() == BroadcastState::Running
    }
}

async fn dispatch<T>(
    token: CancellationToken,
    mut inbox: mpsc::Receiver<T>,
    shared: Arc<Shared<T>>,
    state: watch::Sender<BroadcastState>,
) where
    T: Clone + Send + 'static,
{
    let mut dispatched = 0u64;
    loop {
        let value = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = inbox.recv() => match next {
                Some(value) => value,
                None => break,
            },
        };
        deliver(&shared, value);
        dispatched += 1;
    }

    state.send_replace(BroadcastState::Closing);
    inbox.close();

    let subscribers = {
        let mut registry = shared.registry();
        registry.open = false;
        let count = registry.outboxes.len();
        registry.outboxes.clear();
        count
    };

    state.send_replace(BroadcastState::Closed);
    BroadcasterClosed {
        subscribers,
        dispatched,
    }
    .log();
}

fn deliver<T: Clone>(shared: &Shared<T>, value: T) {
    let mut registry = shared.registry();
    let mut gone = Vec::new();

    for (id, outbox) in registry.outboxes.iter() {
        match outbox.try_send(value.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => DeliveryDropped { id: *id }.log(),
            Err(TrySendError::Closed(_)) => gone.push(*id),
        }
    }

    for id in gone {
        registry.outboxes.remove(&id);
        SubscriberRemoved { id, explicit: false }.log();
    }
}
