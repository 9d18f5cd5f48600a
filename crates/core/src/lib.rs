//! Pure domain rules for the Posty token economy and notification badge.
//!
//! Nothing in this crate performs I/O. The stateful, serialized services
//! that persist these types live in `posty-economy`; the storage layer lives
//! in `posty-store`.

pub mod account;
pub mod activity;
pub mod badge;
pub mod clock;
pub mod config;
pub mod earn;
pub mod error;
pub mod plan;
pub mod types;
