//! Badge counter service: unread count, display list and OS mirroring.
//!
//! State lives behind a `tokio::sync::Mutex`; every mutation computes the
//! next state on a copy, persists it, and only then swaps it in, mirrors the
//! count to the [`BadgeSink`] and publishes a `BadgeUpdated` event. A failed
//! write leaves the in-memory state untouched and is returned to the caller.

use std::sync::Arc;

use posty_core::badge::{BadgeNotification, BadgeState, NotificationType};
use posty_core::clock::Clock;
use posty_events::{EconomyEvent, EventBus, EventKind};
use posty_store::repositories::BadgeRepo;
use posty_store::DurableStore;
use tokio::sync::{watch, Mutex};

use crate::error::BadgeError;
use crate::sink::BadgeSink;

/// Which badge keys a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dirty {
    Count,
    Both,
}

/// Serialized unread-badge governor.
pub struct BadgeCounter {
    store: Arc<dyn DurableStore>,
    sink: Arc<dyn BadgeSink>,
    clock: Arc<dyn Clock>,
    bus: Arc<EventBus>,
    capacity: usize,
    state: Mutex<BadgeState>,
    cache: watch::Sender<BadgeState>,
}

impl BadgeCounter {
    pub fn new(
        store: Arc<dyn DurableStore>,
        sink: Arc<dyn BadgeSink>,
        clock: Arc<dyn Clock>,
        bus: Arc<EventBus>,
        capacity: usize,
    ) -> Self {
        let (cache, _) = watch::channel(BadgeState::default());
        Self {
            store,
            sink,
            clock,
            bus,
            capacity,
            state: Mutex::new(BadgeState::default()),
            cache,
        }
    }

    /// Load the persisted count and list, then resync the OS badge.
    ///
    /// Unreadable values fall back to zero / empty and are logged.
    pub async fn initialize(&self) {
        let mut state = self.state.lock().await;

        let count = BadgeRepo::load_count(&*self.store)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to load badge count, starting at 0");
                0
            });
        let notifications = BadgeRepo::load_notifications(&*self.store)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to load badge notifications");
                Vec::new()
            });

        *state = BadgeState {
            count,
            notifications,
        };
        self.cache.send_replace(state.clone());
        self.mirror(state.count).await;

        tracing::info!(
            count = state.count,
            notifications = state.notifications.len(),
            "Badge initialized"
        );
    }

    /// Bump the count, optionally recording the notification.
    ///
    /// Entries evicted from the display list keep counting as unread.
    pub async fn increment(
        &self,
        notification: Option<BadgeNotification>,
    ) -> Result<u32, BadgeError> {
        let capacity = self.capacity;
        let dirty = if notification.is_some() {
            Dirty::Both
        } else {
            Dirty::Count
        };
        self.mutate(dirty, |state| {
            let evicted = state.increment(notification, capacity);
            let evicted_unread = evicted.iter().filter(|n| !n.is_read).count();
            if evicted_unread > 0 {
                tracing::debug!(evicted_unread, "Unread notifications dropped from display list");
            }
            true
        })
        .await
    }

    /// `count = max(0, count - by)`.
    pub async fn decrement(&self, by: u32) -> Result<u32, BadgeError> {
        self.mutate(Dirty::Count, |state| state.decrement(by)).await
    }

    /// Mark one notification read. Unknown or already-read ids are no-ops.
    pub async fn mark_read(&self, id: &str) -> Result<u32, BadgeError> {
        self.mutate(Dirty::Both, |state| state.mark_read(id)).await
    }

    /// Zero the count and mark every notification read.
    pub async fn clear_all(&self) -> Result<u32, BadgeError> {
        self.mutate(Dirty::Both, |state| {
            state.clear_all();
            true
        })
        .await
    }

    /// Mark every unread notification of `kind` read.
    pub async fn mark_screen_visited(&self, kind: NotificationType) -> Result<u32, BadgeError> {
        self.mutate(Dirty::Both, |state| state.mark_kind_read(kind) > 0)
            .await
    }

    /// Foreground heuristic: assume one notification was seen.
    pub async fn handle_app_active(&self) -> Result<u32, BadgeError> {
        self.mutate(Dirty::Count, |state| state.count > 0 && state.decrement(1))
            .await
    }

    /// Remove both badge keys and zero the OS badge (account deletion).
    pub async fn clear(&self) -> Result<(), BadgeError> {
        let mut state = self.state.lock().await;
        BadgeRepo::delete(&*self.store).await?;
        *state = BadgeState::default();
        self.cache.send_replace(state.clone());
        self.mirror(0).await;
        Ok(())
    }

    // -- synchronous reads -------------------------------------------------

    pub fn count(&self) -> u32 {
        self.cache.borrow().count
    }

    /// Every notification in the display list, newest first.
    pub fn notifications(&self) -> Vec<BadgeNotification> {
        self.cache.borrow().notifications.clone()
    }

    pub fn unread_notifications(&self) -> Vec<BadgeNotification> {
        self.cache.borrow().unread().cloned().collect()
    }

    /// Receive every committed badge state.
    pub fn subscribe(&self) -> watch::Receiver<BadgeState> {
        self.cache.subscribe()
    }

    // -- internals ---------------------------------------------------------

    /// Apply `f` to a copy of the state; persist and commit if it reports a
    /// change. Returns the resulting count.
    async fn mutate<F>(&self, dirty: Dirty, f: F) -> Result<u32, BadgeError>
    where
        F: FnOnce(&mut BadgeState) -> bool,
    {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        if !f(&mut next) {
            return Ok(state.count);
        }

        let store = &*self.store;
        let write = match dirty {
            Dirty::Count => BadgeRepo::save_count(store, next.count).await,
            Dirty::Both => BadgeRepo::save_state(store, &next).await,
        };
        if let Err(e) = write {
            tracing::error!(error = %e, "Failed to persist badge state");
            return Err(e.into());
        }

        let count_changed = next.count != state.count;
        *state = next;
        self.cache.send_replace(state.clone());

        if count_changed {
            self.mirror(state.count).await;
            self.bus.publish(
                EconomyEvent::new(EventKind::BadgeUpdated { count: state.count })
                    .at(self.clock.now()),
            );
        }
        tracing::debug!(count = state.count, "Badge state committed");
        Ok(state.count)
    }

    /// Best-effort OS badge update. Failures are logged and swallowed; the
    /// logical count stays authoritative.
    async fn mirror(&self, count: u32) {
        if let Err(e) = self.sink.set_application_badge(count).await {
            tracing::warn!(error = %e, count, "Platform badge update failed, keeping logical count");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
