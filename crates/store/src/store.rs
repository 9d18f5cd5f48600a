//! The abstract durable store contract.

use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for store reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing medium failed (disk, permissions, ...).
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be encoded or decoded.
    #[error("Store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Back-end specific failure that is neither I/O nor encoding.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the value exists but is unreadable (corrupt JSON, bad integer).
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Serialization(_))
    }
}

// ---------------------------------------------------------------------------
// DurableStore
// ---------------------------------------------------------------------------

/// Asynchronous key→string store with no cross-key transactions.
///
/// A single `set` must be atomic for its key: readers observe either the old
/// or the new value, never a partial write.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Fetch a value, `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// List every key currently stored.
    async fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Remove several keys. Not atomic across keys.
    async fn multi_remove(&self, keys: &[String]) -> Result<(), StoreError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }

    /// Write several keys in order. Not atomic across keys.
    async fn multi_set(&self, pairs: &[(&str, String)]) -> Result<(), StoreError> {
        for (key, value) in pairs {
            self.set(key, value).await?;
        }
        Ok(())
    }
}
