//! Durable key-value storage for the Posty economy.
//!
//! [`DurableStore`] is the abstract async key→string store the services are
//! written against. Two back-ends are provided: [`MemoryStore`] (tests,
//! ephemeral sessions) and [`FileStore`] (one file per key on disk). The
//! typed [`repositories`] own the JSON encoding of each key.

pub mod file;
pub mod keys;
pub mod memory;
pub mod repositories;
pub mod store;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{DurableStore, StoreError};
