// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for broadcaster dispatcher and subscriber events.

use crate::broadcast::SubscriberId;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Broadcaster dispatcher started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_millrace::observability::messages::broadcast::BroadcasterStarted;
///
/// let msg = BroadcasterStarted {
///     inbox_capacity: 10,
///     outbox_capacity: 10,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BroadcasterStarted {
    pub inbox_capacity: usize,
    pub outbox_capacity: usize,
}

impl Display for BroadcasterStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Broadcaster started: inbox_capacity={}, default outbox_capacity={}",
            self.inbox_capacity, self.outbox_capacity
        )
    }
}

impl StructuredLog for BroadcasterStarted {
    fn log(&self) {
        tracing::info!(
            inbox_capacity = self.inbox_capacity,
            outbox_capacity = self.outbox_capacity,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "broadcaster",
            span_name = name,
            inbox_capacity = self.inbox_capacity,
            outbox_capacity = self.outbox_capacity,
        )
    }
}

/// A subscriber outbox was created.
///
/// # Log Level
/// `debug!` - Subscriber churn
pub struct SubscriberAdded {
    pub id: SubscriberId,
    pub capacity: usize,
}

impl Display for SubscriberAdded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Subscriber {} added: outbox_capacity={}", self.id, self.capacity)
    }
}

impl StructuredLog for SubscriberAdded {
    fn log(&self) {
        tracing::debug!(subscriber = self.id.get(), capacity = self.capacity, "{}", self);
    }
}

/// A subscriber was removed, either explicitly or because its outbox was dropped.
///
/// # Log Level
/// `debug!` - Subscriber churn
pub struct SubscriberRemoved {
    pub id: SubscriberId,
    pub explicit: bool,
}

impl Display for SubscriberRemoved {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let how = if self.explicit { "unsubscribed" } else { "pruned (receiver dropped)" };
        write!(f, "Subscriber {} removed: {}", self.id, how)
    }
}

impl StructuredLog for SubscriberRemoved {
    fn log(&self) {
        tracing::debug!(subscriber = self.id.get(), explicit = self.explicit, "{}", self);
    }
}

/// A value was dropped for one subscriber because its outbox was full.
///
/// # Log Level
/// `debug!` - Expected under best-effort delivery
///
/// # Example
/// ```
/// use the_millrace::observability::messages::broadcast::DeliveryDropped;
/// use the_millrace::broadcast::SubscriberId;
///
/// let msg = DeliveryDropped { id: SubscriberId::new(3) };
/// assert!(msg.to_string().contains("outbox full"));
/// ```
pub struct DeliveryDropped {
    pub id: SubscriberId,
}

impl Display for DeliveryDropped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Dropped value for subscriber {}: outbox full", self.id)
    }
}

impl StructuredLog for DeliveryDropped {
    fn log(&self) {
        tracing::debug!(subscriber = self.id.get(), "{}", self);
    }
}

/// Broadcaster reached its terminal state.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BroadcasterClosed {
    pub subscribers: usize,
    pub dispatched: u64,
}

impl Display for BroadcasterClosed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Broadcaster closed: {} values dispatched, {} subscriber outboxes closed",
            self.dispatched, self.subscribers
        )
    }
}

impl StructuredLog for BroadcasterClosed {
    fn log(&self) {
        tracing::info!(
            subscribers = self.subscribers,
            dispatched = self.dispatched,
            "{}", self
        );
    }
}
