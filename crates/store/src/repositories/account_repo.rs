//! Repository for the ledger record and the legacy per-day quota keys.

use posty_core::account::{StoredAccount, TokenAccount};
use posty_core::types::{CalendarDate, Tokens};

use crate::keys;
use crate::store::{DurableStore, StoreError};

/// Reads and writes the [`TokenAccount`] blob.
pub struct AccountRepo;

impl AccountRepo {
    /// Load the ledger record in whichever shape it was written, `None` if it
    /// has never been created.
    pub async fn find(store: &dyn DurableStore) -> Result<Option<StoredAccount>, StoreError> {
        match store.get(keys::ACCOUNT).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Copy the raw ledger record to [`keys::ACCOUNT_BACKUP`] before it is
    /// replaced.
    pub async fn back_up(store: &dyn DurableStore) -> Result<(), StoreError> {
        if let Some(raw) = store.get(keys::ACCOUNT).await? {
            store.set(keys::ACCOUNT_BACKUP, &raw).await?;
        }
        Ok(())
    }

    /// Persist the whole account as one JSON blob.
    pub async fn save(store: &dyn DurableStore, account: &TokenAccount) -> Result<(), StoreError> {
        let raw = serde_json::to_string(account)?;
        store.set(keys::ACCOUNT, &raw).await
    }

    pub async fn delete(store: &dyn DurableStore) -> Result<(), StoreError> {
        store.remove(keys::ACCOUNT).await
    }

    /// Earned-today count left behind under the legacy date-scoped key.
    pub async fn find_legacy_earned(
        store: &dyn DurableStore,
        date: CalendarDate,
    ) -> Result<Option<Tokens>, StoreError> {
        match store.get(&keys::legacy_earned_key(date)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(raw.trim())?)),
            None => Ok(None),
        }
    }

    pub async fn delete_legacy_earned(
        store: &dyn DurableStore,
        date: CalendarDate,
    ) -> Result<(), StoreError> {
        store.remove(&keys::legacy_earned_key(date)).await
    }

    /// Remove the ledger record and every legacy quota key.
    pub async fn purge(store: &dyn DurableStore) -> Result<(), StoreError> {
        let existing = store.keys().await?;
        store.multi_remove(&keys::ledger_keys(&existing)).await
    }
}
