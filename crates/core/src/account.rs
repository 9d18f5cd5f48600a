//! Token account state and the ledger rules that mutate it.
//!
//! Pure logic. The serialized, persisted ledger service in `posty-economy`
//! loads a [`TokenAccount`], applies these rules and writes the whole record
//! back as one JSON blob, so `balance` and `earned_today` can never tear.

use serde::{Deserialize, Serialize};

use crate::error::InsufficientBalance;
use crate::plan::Plan;
use crate::types::{CalendarDate, Timestamp, Tokens};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Daily cap on tokens acquired through reward actions.
pub const MAX_DAILY_EARNED: Tokens = 20;

/// Tokens granted when an account is created.
pub const INITIAL_GRANT: Tokens = 10;

// ---------------------------------------------------------------------------
// TokenAccount
// ---------------------------------------------------------------------------

/// A user's spendable token state.
///
/// Invariants maintained by every method on this type:
/// - `balance <= plan.ceiling()`
/// - `daily_free_tokens <= plan.limits().daily_free_tokens`
/// - `earned_today` only grows through [`apply_earn`](crate::earn) and is
///   zeroed by the daily reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccount {
    pub plan: Plan,
    /// Portion of the balance that came from today's free refill.
    pub daily_free_tokens: Tokens,
    /// Tokens gained via reward actions since the last reset.
    pub earned_today: Tokens,
    pub balance: Tokens,
    pub last_reset_date: CalendarDate,
}

impl TokenAccount {
    /// A brand-new free account holding the initial grant.
    pub fn new(today: CalendarDate, initial_grant: Tokens) -> Self {
        let plan = Plan::Free;
        let granted = initial_grant.min(plan.ceiling());
        Self {
            plan,
            daily_free_tokens: granted.min(plan.limits().daily_free_tokens),
            earned_today: 0,
            balance: granted,
            last_reset_date: today,
        }
    }

    /// Zeroed placeholder used before the first successful load.
    pub fn empty(today: CalendarDate) -> Self {
        Self {
            plan: Plan::Free,
            daily_free_tokens: 0,
            earned_today: 0,
            balance: 0,
            last_reset_date: today,
        }
    }

    /// Balance the user may spend right now. Pro reports its sentinel ceiling.
    pub fn spendable(&self) -> Tokens {
        if self.plan.is_unbounded() {
            self.plan.ceiling()
        } else {
            self.balance
        }
    }

    /// Earn quota left for today under `max_daily_earned`.
    pub fn remaining_earn_quota(&self, max_daily_earned: Tokens) -> Tokens {
        max_daily_earned.saturating_sub(self.earned_today)
    }

    /// Whether the daily reset is due on `today`.
    ///
    /// Keyed on calendar date, not a rolling 24h window: opening the app just
    /// before and just after midnight yields two resets.
    pub fn needs_reset(&self, today: CalendarDate) -> bool {
        self.last_reset_date != today
    }

    /// Apply the daily refill if it has not run yet today.
    ///
    /// Tops `daily_free_tokens` back up to the plan amount, credits the same
    /// top-up to `balance` (clamped at the ceiling), zeroes `earned_today`
    /// and advances `last_reset_date`. Returns `true` if anything changed;
    /// a second call on the same date is a no-op.
    pub fn apply_daily_reset(&mut self, today: CalendarDate) -> bool {
        if !self.needs_reset(today) {
            return false;
        }
        let limits = self.plan.limits();
        let top_up = limits
            .daily_free_tokens
            .saturating_sub(self.daily_free_tokens);

        self.daily_free_tokens = limits.daily_free_tokens;
        self.balance = self.balance.saturating_add(top_up).min(limits.ceiling);
        self.earned_today = 0;
        self.last_reset_date = today;
        true
    }

    /// Deduct `amount` tokens.
    ///
    /// Rejected (not clamped) when the balance is too low. Pro always
    /// succeeds and keeps its balance. Free daily tokens are consumed first.
    pub fn spend(&mut self, amount: Tokens) -> Result<(), InsufficientBalance> {
        if self.plan.is_unbounded() {
            return Ok(());
        }
        if amount > self.balance {
            return Err(InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.daily_free_tokens = self.daily_free_tokens.saturating_sub(amount);
        Ok(())
    }

    /// Credit `amount` tokens, silently clamping at the plan ceiling.
    ///
    /// Returns the number of tokens that actually landed in the balance.
    pub fn credit(&mut self, amount: Tokens) -> Tokens {
        let ceiling = self.plan.ceiling();
        let before = self.balance;
        self.balance = self.balance.saturating_add(amount).min(ceiling);
        self.balance - before
    }

    /// Switch plan without refilling.
    ///
    /// The balance is preserved unless it exceeds the new ceiling, in which
    /// case it is clamped down.
    pub fn set_plan(&mut self, plan: Plan) {
        let limits = plan.limits();
        self.plan = plan;
        self.balance = self.balance.min(limits.ceiling);
        self.daily_free_tokens = self.daily_free_tokens.min(limits.daily_free_tokens);
    }
}

// ---------------------------------------------------------------------------
// Stored record
// ---------------------------------------------------------------------------

/// Subscription record written by earlier app versions under the ledger key.
///
/// Only the fields that carry balance or plan are read; `isTrialUsed` and
/// `tokenHistory` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySubscription {
    pub plan: Plan,
    /// Tokens left for the day. Negative meant unlimited.
    pub daily_tokens: i64,
    pub last_reset_date: Timestamp,
}

impl LegacySubscription {
    /// Convert to a [`TokenAccount`] whose last reset fell on
    /// `last_reset_date` (the local date of the stored instant).
    ///
    /// The remaining daily tokens become the balance, clamped to the plan
    /// ceiling, and count as today's free tokens. Earned-today starts at zero.
    pub fn into_account(self, last_reset_date: CalendarDate) -> TokenAccount {
        let limits = self.plan.limits();
        let balance = if self.daily_tokens < 0 {
            limits.ceiling
        } else {
            Tokens::try_from(self.daily_tokens)
                .unwrap_or(Tokens::MAX)
                .min(limits.ceiling)
        };
        TokenAccount {
            plan: self.plan,
            daily_free_tokens: balance.min(limits.daily_free_tokens),
            earned_today: 0,
            balance,
            last_reset_date,
        }
    }
}

/// Either shape found under the ledger key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StoredAccount {
    Current(TokenAccount),
    Legacy(LegacySubscription),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
