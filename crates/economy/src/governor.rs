//! Earn governor: gates reward-driven token acquisition against the daily cap.
//!
//! The whole earn (quota check, ledger write, activity append) runs inside
//! one [`LedgerSession`](crate::ledger), so concurrent `earn` calls cannot
//! both observe the same `earned_today` and over-credit the user.

use std::sync::Arc;

use posty_core::activity::TokenActivityEntry;
use posty_core::clock::Clock;
use posty_core::earn::{apply_earn, EarnOutcome};
use posty_core::types::Tokens;
use posty_events::{EconomyEvent, EventBus, EventKind};

use crate::activity_log::ActivityLog;
use crate::error::LedgerError;
use crate::ledger::TokenLedger;

/// Daily earn-cap enforcement in front of the [`TokenLedger`].
pub struct EarnGovernor {
    ledger: Arc<TokenLedger>,
    activity: Arc<ActivityLog>,
    clock: Arc<dyn Clock>,
    bus: Arc<EventBus>,
    enforce_anomaly_signals: bool,
}

impl EarnGovernor {
    pub fn new(
        ledger: Arc<TokenLedger>,
        activity: Arc<ActivityLog>,
        clock: Arc<dyn Clock>,
        bus: Arc<EventBus>,
        enforce_anomaly_signals: bool,
    ) -> Self {
        Self {
            ledger,
            activity,
            clock,
            bus,
            enforce_anomaly_signals,
        }
    }

    /// Request `requested` reward tokens on behalf of `source`.
    ///
    /// Returns [`EarnOutcome::Granted`] / [`EarnOutcome::PartiallyGranted`]
    /// after persisting, or [`EarnOutcome::Denied`] with no state change once
    /// the cap is reached. With enforcement on, a flagged window yields
    /// [`EarnOutcome::Withheld`] unless the cap already denies the earn.
    /// `requested == 0` is a caller error.
    pub async fn earn(&self, requested: Tokens, source: &str) -> Result<EarnOutcome, LedgerError> {
        if requested == 0 {
            return Err(LedgerError::InvalidAmount(requested));
        }

        let mut session = self.ledger.begin().await?;
        let now = self.clock.now();

        if session
            .account()
            .remaining_earn_quota(session.max_daily_earned())
            == 0
        {
            tracing::info!(
                requested,
                source,
                earned_today = session.account().earned_today,
                "Earn denied: daily cap reached"
            );
            return Ok(EarnOutcome::Denied);
        }

        if self.enforce_anomaly_signals {
            let signals = self.activity.evaluate_at(now).await;
            if !signals.is_empty() {
                tracing::warn!(
                    requested,
                    source,
                    signals = signals.len(),
                    "Earn withheld: recent activity is flagged"
                );
                return Ok(EarnOutcome::Withheld(signals));
            }
        }

        let max_daily = session.max_daily_earned();
        let outcome = apply_earn(session.account_mut(), requested, max_daily);
        let granted = outcome.granted();
        let account = session.commit().await?;

        if let Err(e) = self
            .activity
            .record(TokenActivityEntry::earn(granted, source, now))
            .await
        {
            tracing::error!(error = %e, source, "Failed to log token earn");
        }

        self.bus.publish(
            EconomyEvent::new(EventKind::TokensEarned {
                amount: granted,
                source: source.to_string(),
            })
            .at(now),
        );
        tracing::info!(
            requested,
            granted,
            source,
            outcome = outcome.label(),
            balance = account.balance,
            earned_today = account.earned_today,
            "Reward tokens granted"
        );

        Ok(outcome)
    }
}
