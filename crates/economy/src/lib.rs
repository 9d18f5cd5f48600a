//! Stateful, serialized services of the Posty token economy.
//!
//! - [`TokenLedger`]: balance, plan and daily refill.
//! - [`EarnGovernor`]: reward earns under the daily cap.
//! - [`ActivityLog`]: bounded earn/spend history with anomaly signals.
//! - [`BadgeCounter`]: unread count, display list and OS badge mirror.
//! - [`NotificationIngest`]: push payloads into the badge counter.
//!
//! [`Economy`] wires one instance of each around a shared store, clock and
//! event bus. Callers that need several independent economies (tests,
//! multiple profiles) simply build several.

pub mod activity_log;
pub mod badge;
pub mod error;
pub mod governor;
pub mod ingest;
pub mod ledger;
pub mod sink;

use std::sync::Arc;

use posty_core::clock::Clock;
use posty_core::config::EconomyConfig;
use posty_events::EventBus;
use posty_store::DurableStore;

pub use activity_log::ActivityLog;
pub use badge::BadgeCounter;
pub use error::{BadgeError, LedgerError};
pub use governor::EarnGovernor;
pub use ingest::{NotificationIngest, PushContent, PushMessage};
pub use ledger::{TokenLedger, DEFAULT_SPEND_SOURCE};
pub use sink::{BadgeSink, LoggingSink, SinkError};

/// Errors from whole-account operations.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Badge(#[from] BadgeError),

    #[error(transparent)]
    Store(#[from] posty_store::StoreError),
}

/// The full set of economy services for one user.
pub struct Economy {
    pub ledger: Arc<TokenLedger>,
    pub governor: Arc<EarnGovernor>,
    pub activity: Arc<ActivityLog>,
    pub badges: Arc<BadgeCounter>,
    pub ingest: Arc<NotificationIngest>,
    store: Arc<dyn DurableStore>,
    bus: Arc<EventBus>,
}

impl Economy {
    pub fn new(
        store: Arc<dyn DurableStore>,
        sink: Arc<dyn BadgeSink>,
        clock: Arc<dyn Clock>,
        config: EconomyConfig,
    ) -> Self {
        let bus = Arc::new(EventBus::default());
        let activity = Arc::new(ActivityLog::new(
            store.clone(),
            clock.clone(),
            bus.clone(),
            &config,
        ));
        let ledger = Arc::new(TokenLedger::new(
            store.clone(),
            clock.clone(),
            bus.clone(),
            activity.clone(),
            config.clone(),
        ));
        let governor = Arc::new(EarnGovernor::new(
            ledger.clone(),
            activity.clone(),
            clock.clone(),
            bus.clone(),
            config.enforce_anomaly_signals,
        ));
        let badges = Arc::new(BadgeCounter::new(
            store.clone(),
            sink,
            clock.clone(),
            bus.clone(),
            config.notification_capacity,
        ));
        let ingest = Arc::new(NotificationIngest::new(badges.clone(), clock));

        Self {
            ledger,
            governor,
            activity,
            badges,
            ingest,
            store,
            bus,
        }
    }

    /// Warm the ledger cache (running the daily reset) and load the badge.
    pub async fn initialize(&self) {
        let account = self.ledger.account().await;
        self.badges.initialize().await;
        tracing::info!(
            plan = %account.plan,
            balance = account.balance,
            earned_today = account.earned_today,
            badge = self.badges.count(),
            "Economy initialized"
        );
    }

    /// Remove every key owned by the economy, including stale legacy quota
    /// keys, and reset the in-memory state.
    pub async fn delete_account(&self) -> Result<(), EconomyError> {
        self.ledger.clear().await?;
        self.activity.clear().await?;
        self.badges.clear().await?;
        tracing::info!("Economy account deleted");
        Ok(())
    }

    /// Shared durable store.
    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// The bus every service publishes on.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }
}
