//! Persisted key names.
//!
//! Each subsystem owns a disjoint set of keys and never writes another's.
//! Names match the keys the mobile app already writes, so existing installs
//! keep their state.

use posty_core::types::CalendarDate;

/// Ledger record: one JSON blob holding the whole [`TokenAccount`]. Older
/// installs hold a [`LegacySubscription`] here, migrated on first load.
///
/// [`TokenAccount`]: posty_core::account::TokenAccount
/// [`LegacySubscription`]: posty_core::account::LegacySubscription
pub const ACCOUNT: &str = "USER_SUBSCRIPTION";

/// Copy of an unreadable ledger record, kept for manual recovery.
pub const ACCOUNT_BACKUP: &str = "USER_SUBSCRIPTION_unreadable";

/// Prefix of the legacy per-day earn-quota keys.
pub const LEGACY_EARNED_PREFIX: &str = "earned_tokens_";

/// Activity log: JSON array of entries.
pub const ACTIVITY_LOG: &str = "token_activity_logs";

/// Badge counter: integer encoded as a decimal string.
pub const BADGE_COUNT: &str = "app_badge_count";

/// Badge display list: JSON array of notifications, newest first.
pub const BADGE_NOTIFICATIONS: &str = "badge_notifications";

/// Legacy quota key for `date`, e.g. `earned_tokens_Sun Oct 18 2026`.
///
/// The date part mirrors JavaScript's `Date.prototype.toDateString()`.
pub fn legacy_earned_key(date: CalendarDate) -> String {
    format!("{LEGACY_EARNED_PREFIX}{}", date.format("%a %b %d %Y"))
}

/// Every key owned by the token ledger, including legacy quota keys found in
/// `existing`.
pub fn ledger_keys(existing: &[String]) -> Vec<String> {
    let mut keys = vec![ACCOUNT.to_string(), ACCOUNT_BACKUP.to_string()];
    keys.extend(
        existing
            .iter()
            .filter(|k| k.starts_with(LEGACY_EARNED_PREFIX))
            .cloned(),
    );
    keys
}
