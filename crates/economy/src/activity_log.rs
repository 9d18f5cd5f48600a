//! Persisted activity log with the observational anomaly detector.
//!
//! [`ActivityLog`] appends [`TokenActivityEntry`] records, keeps the most
//! recent `activity_log_capacity` of them and evaluates the burst and
//! repetition rules after every append. Signals are logged, returned and
//! published on the [`EventBus`]; the log never blocks an earn itself.

use std::sync::Arc;

use posty_core::activity::{self, AnomalySignal, AnomalyThresholds, TokenActivityEntry};
use posty_core::clock::Clock;
use posty_core::config::EconomyConfig;
use posty_core::types::{CalendarDate, Timestamp, Tokens};
use posty_events::{EconomyEvent, EventBus, EventKind};
use posty_store::repositories::ActivityRepo;
use posty_store::{DurableStore, StoreError};
use tokio::sync::Mutex;

/// Append-only, count-bounded token activity log.
pub struct ActivityLog {
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn Clock>,
    bus: Arc<EventBus>,
    capacity: usize,
    thresholds: AnomalyThresholds,
    /// Serializes the load-append-save cycle.
    write_lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(
        store: Arc<dyn DurableStore>,
        clock: Arc<dyn Clock>,
        bus: Arc<EventBus>,
        config: &EconomyConfig,
    ) -> Self {
        Self {
            store,
            clock,
            bus,
            capacity: config.activity_log_capacity,
            thresholds: config.anomaly,
            write_lock: Mutex::new(()),
        }
    }

    /// Append `entry`, evict beyond capacity, persist, then evaluate the
    /// earn window ending at the entry's timestamp.
    ///
    /// A corrupt stored log is logged and replaced; an unreadable store is
    /// returned as an error so history is never overwritten blindly.
    pub async fn record(
        &self,
        entry: TokenActivityEntry,
    ) -> Result<Vec<AnomalySignal>, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut log = self.load_for_update().await?;
        let anchor = entry.timestamp;
        let evicted = activity::push_bounded(&mut log, entry, self.capacity);
        ActivityRepo::save(&*self.store, &log).await?;

        if evicted > 0 {
            tracing::debug!(evicted, retained = log.len(), "Activity log trimmed");
        }

        let signals = self.evaluate_entries(&log, anchor);
        self.report(&signals, anchor);
        Ok(signals)
    }

    /// Evaluate the earn window ending at `anchor` without appending.
    ///
    /// Read failures yield no signals.
    pub async fn evaluate_at(&self, anchor: Timestamp) -> Vec<AnomalySignal> {
        let log = self.entries().await;
        self.evaluate_entries(&log, anchor)
    }

    /// All retained entries, oldest first. Read failures yield an empty log.
    pub async fn entries(&self) -> Vec<TokenActivityEntry> {
        match ActivityRepo::load(&*self.store).await {
            Ok(log) => log,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load activity log");
                Vec::new()
            }
        }
    }

    /// Tokens spent on the local calendar `date` according to the retained
    /// entries.
    pub async fn spent_on(&self, date: CalendarDate) -> Tokens {
        activity::spent_on(&self.entries().await, date, &*self.clock)
    }

    /// Tokens spent since local midnight (the usage line on the token screen).
    pub async fn spent_today(&self) -> Tokens {
        self.spent_on(self.clock.today()).await
    }

    /// Remove the persisted log (account deletion).
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        ActivityRepo::delete(&*self.store).await
    }

    async fn load_for_update(&self) -> Result<Vec<TokenActivityEntry>, StoreError> {
        match ActivityRepo::load(&*self.store).await {
            Ok(log) => Ok(log),
            Err(e) if e.is_corrupt() => {
                tracing::warn!(error = %e, "Activity log unreadable, starting a fresh log");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    fn evaluate_entries(
        &self,
        log: &[TokenActivityEntry],
        anchor: Timestamp,
    ) -> Vec<AnomalySignal> {
        let window = activity::earn_window(log, anchor, self.thresholds.window);
        activity::evaluate(&window, &self.thresholds)
    }

    fn report(&self, signals: &[AnomalySignal], at: Timestamp) {
        for signal in signals {
            match signal {
                AnomalySignal::BurstDetected { count } => {
                    tracing::warn!(count, "Suspicious pattern: too many token earns in window");
                }
                AnomalySignal::RepeatedSourceDetected { source, count } => {
                    tracing::warn!(source = %source, count, "Suspicious pattern: repeated earn source");
                }
            }
            self.bus.publish(
                EconomyEvent::new(EventKind::AnomalyDetected {
                    signal: signal.clone(),
                })
                .at(at),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
