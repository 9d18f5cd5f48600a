//! Posty economy event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`EconomyEvent`]: the envelope published whenever the ledger, the
//!   activity log or the badge counter changes state.
//!
//! Anomaly signals reach interested callers through this bus: subscribing is
//! how a caller opts in to acting on them.

pub mod bus;

pub use bus::{EconomyEvent, EventBus, EventKind};
