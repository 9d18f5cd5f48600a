//! Repository for the badge count and notification list.

use posty_core::badge::{BadgeNotification, BadgeState};

use crate::keys;
use crate::store::{DurableStore, StoreError};

/// Reads and writes the two badge keys.
pub struct BadgeRepo;

impl BadgeRepo {
    /// Stored unread count. Absent key → 0.
    pub async fn load_count(store: &dyn DurableStore) -> Result<u32, StoreError> {
        match store.get(keys::BADGE_COUNT).await? {
            Some(raw) => Ok(serde_json::from_str(raw.trim())?),
            None => Ok(0),
        }
    }

    /// Stored display list, newest first. Absent key → empty.
    pub async fn load_notifications(
        store: &dyn DurableStore,
    ) -> Result<Vec<BadgeNotification>, StoreError> {
        match store.get(keys::BADGE_NOTIFICATIONS).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_count(store: &dyn DurableStore, count: u32) -> Result<(), StoreError> {
        store.set(keys::BADGE_COUNT, &count.to_string()).await
    }

    pub async fn save_notifications(
        store: &dyn DurableStore,
        notifications: &[BadgeNotification],
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(notifications)?;
        store.set(keys::BADGE_NOTIFICATIONS, &raw).await
    }

    /// Write list then count in one batch.
    pub async fn save_state(store: &dyn DurableStore, state: &BadgeState) -> Result<(), StoreError> {
        let list = serde_json::to_string(&state.notifications)?;
        store
            .multi_set(&[
                (keys::BADGE_NOTIFICATIONS, list),
                (keys::BADGE_COUNT, state.count.to_string()),
            ])
            .await
    }

    pub async fn delete(store: &dyn DurableStore) -> Result<(), StoreError> {
        store
            .multi_remove(&[
                keys::BADGE_COUNT.to_string(),
                keys::BADGE_NOTIFICATIONS.to_string(),
            ])
            .await
    }
}
