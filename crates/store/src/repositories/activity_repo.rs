//! Repository for the token activity log.

use posty_core::activity::TokenActivityEntry;

use crate::keys;
use crate::store::{DurableStore, StoreError};

/// Reads and writes the activity log array.
pub struct ActivityRepo;

impl ActivityRepo {
    /// Load every retained entry, oldest first. Absent key → empty log.
    pub async fn load(store: &dyn DurableStore) -> Result<Vec<TokenActivityEntry>, StoreError> {
        match store.get(keys::ACTIVITY_LOG).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save(
        store: &dyn DurableStore,
        entries: &[TokenActivityEntry],
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(entries)?;
        store.set(keys::ACTIVITY_LOG, &raw).await
    }

    pub async fn delete(store: &dyn DurableStore) -> Result<(), StoreError> {
        store.remove(keys::ACTIVITY_LOG).await
    }
}
