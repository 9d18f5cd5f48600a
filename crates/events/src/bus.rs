//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the economy services.

use chrono::Utc;
use posty_core::activity::AnomalySignal;
use posty_core::plan::Plan;
use posty_core::types::{Timestamp, Tokens};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// EconomyEvent
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The ledger record was persisted with new values.
    AccountUpdated {
        plan: Plan,
        balance: Tokens,
        earned_today: Tokens,
    },
    /// Reward tokens were granted.
    TokensEarned { amount: Tokens, source: String },
    /// Tokens were spent.
    TokensSpent { amount: Tokens, source: String },
    /// The activity log flagged the recent earn window.
    AnomalyDetected { signal: AnomalySignal },
    /// The unread badge count changed.
    BadgeUpdated { count: u32 },
}

/// A domain event with its creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyEvent {
    #[serde(flatten)]
    pub kind: EventKind,

    /// When the event was created (UTC).
    pub timestamp: Timestamp,
}

impl EconomyEvent {
    /// Create an event stamped with the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp (services pass their injected clock's time).
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Dot-separated event name, e.g. `"badge.updated"`.
    pub fn name(&self) -> &'static str {
        match self.kind {
            EventKind::AccountUpdated { .. } => "account.updated",
            EventKind::TokensEarned { .. } => "tokens.earned",
            EventKind::TokensSpent { .. } => "tokens.spent",
            EventKind::AnomalyDetected { .. } => "anomaly.detected",
            EventKind::BadgeUpdated { .. } => "badge.updated",
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`EconomyEvent`].
///
/// # Usage
///
/// ```rust
/// use posty_events::bus::{EconomyEvent, EventBus, EventKind};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(EconomyEvent::new(EventKind::BadgeUpdated { count: 1 }));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<EconomyEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: EconomyEvent) {
        tracing::trace!(event = event.name(), "Publishing economy event");
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<EconomyEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
