//! Daily earn-cap rule for reward-driven token acquisition.
//!
//! Independent of the free daily refill: the cap only bounds tokens gained
//! through reward actions (ads, missions, the earn modal).

use serde::{Deserialize, Serialize};

use crate::account::TokenAccount;
use crate::activity::AnomalySignal;
use crate::types::Tokens;

/// Result of an earn request.
///
/// Callers must branch on every variant to inform the user; none of these
/// are errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "amount", rename_all = "snake_case")]
pub enum EarnOutcome {
    /// The full requested amount was applied.
    Granted(Tokens),
    /// Only the remaining daily quota was applied.
    PartiallyGranted(Tokens),
    /// The daily cap was already reached; nothing changed.
    Denied,
    /// Anomaly enforcement is enabled and the recent earn window is flagged;
    /// nothing changed.
    Withheld(Vec<AnomalySignal>),
}

impl EarnOutcome {
    /// Tokens counted against the daily quota by this outcome.
    pub fn granted(&self) -> Tokens {
        match self {
            EarnOutcome::Granted(n) | EarnOutcome::PartiallyGranted(n) => *n,
            EarnOutcome::Denied | EarnOutcome::Withheld(_) => 0,
        }
    }

    /// Short label for logs and events.
    pub fn label(&self) -> &'static str {
        match self {
            EarnOutcome::Granted(_) => "granted",
            EarnOutcome::PartiallyGranted(_) => "partially_granted",
            EarnOutcome::Denied => "denied",
            EarnOutcome::Withheld(_) => "withheld",
        }
    }
}

/// Apply an earn request of `requested` tokens against the daily cap.
///
/// On a grant, `earned_today` grows by the granted amount and the balance by
/// the same amount, clamped at the plan ceiling. `requested == 0` must be
/// rejected by the caller before reaching this function; it is treated as a
/// denial here.
pub fn apply_earn(
    account: &mut TokenAccount,
    requested: Tokens,
    max_daily_earned: Tokens,
) -> EarnOutcome {
    let remaining = account.remaining_earn_quota(max_daily_earned);
    if remaining == 0 || requested == 0 {
        return EarnOutcome::Denied;
    }

    let granted = requested.min(remaining);
    account.earned_today += granted;
    account.credit(granted);

    if granted == requested {
        EarnOutcome::Granted(granted)
    } else {
        EarnOutcome::PartiallyGranted(granted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{INITIAL_GRANT, MAX_DAILY_EARNED};
    use crate::plan::Plan;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn fresh() -> TokenAccount {
        TokenAccount::new(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(), INITIAL_GRANT)
    }

    #[test]
    fn fresh_free_account_grants_and_clamps_balance() {
        let mut account = fresh();
        let outcome = apply_earn(&mut account, 5, MAX_DAILY_EARNED);
        assert_eq!(outcome, EarnOutcome::Granted(5));
        assert_eq!(account.balance, 10);
        assert_eq!(account.earned_today, 5);
    }

    #[test]
    fn partial_grant_fills_remaining_quota() {
        let mut account = fresh();
        account.set_plan(Plan::Premium);
        account.earned_today = 18;
        let before = account.balance;

        let outcome = apply_earn(&mut account, 5, MAX_DAILY_EARNED);
        assert_eq!(outcome, EarnOutcome::PartiallyGranted(2));
        assert_eq!(account.earned_today, 20);
        assert_eq!(account.balance, before + 2);
    }

    #[test]
    fn cap_reached_denies_without_change() {
        let mut account = fresh();
        account.earned_today = 20;
        let before = account.clone();

        assert_matches!(apply_earn(&mut account, 1, MAX_DAILY_EARNED), EarnOutcome::Denied);
        assert_eq!(account, before);
    }

    #[test]
    fn zero_request_is_denied() {
        let mut account = fresh();
        assert_matches!(apply_earn(&mut account, 0, MAX_DAILY_EARNED), EarnOutcome::Denied);
        assert_eq!(account.earned_today, 0);
    }

    /// Within one day, `earned_today` never exceeds the cap and equals the sum
    /// of granted amounts.
    #[test]
    fn granted_sum_matches_earned_today() {
        let mut account = fresh();
        account.set_plan(Plan::Starter);
        let mut total = 0;
        for requested in [3, 7, 1, 4, 9, 2, 6, 1] {
            let outcome = apply_earn(&mut account, requested, MAX_DAILY_EARNED);
            total += outcome.granted();
            assert!(account.earned_today <= MAX_DAILY_EARNED);
        }
        assert_eq!(total, account.earned_today);
        assert_eq!(account.earned_today, MAX_DAILY_EARNED);
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let json = serde_json::to_value(EarnOutcome::PartiallyGranted(2)).unwrap();
        assert_eq!(json["outcome"], "partially_granted");
        assert_eq!(json["amount"], 2);
    }
}
