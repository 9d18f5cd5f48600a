//! Token activity entries and the anomaly rules evaluated over them.
//!
//! Pure logic, no storage access. The activity-log service appends entries,
//! persists them and hands the recent window to [`evaluate`]. Detected
//! signals are observational: nothing here blocks an earn.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::types::{CalendarDate, Timestamp, Tokens};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of entries retained in the activity log.
pub const ACTIVITY_LOG_CAPACITY: usize = 100;

/// Earns within the window strictly above this count raise a burst signal.
pub const BURST_THRESHOLD: usize = 10;

/// Earns from one source strictly above this count raise a repetition signal.
pub const REPEAT_THRESHOLD: usize = 5;

/// Length of the evaluation window, in seconds.
pub const ANOMALY_WINDOW_SECS: i64 = 3600;

// ---------------------------------------------------------------------------
// TokenActivityEntry
// ---------------------------------------------------------------------------

/// Direction of a token movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Earn,
    Spend,
}

/// A single append-only activity record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenActivityEntry {
    pub action: ActivityAction,
    pub amount: Tokens,
    /// Free-form tag for the triggering flow, e.g. `"ad_reward"`.
    pub source: String,
    pub timestamp: Timestamp,
}

impl TokenActivityEntry {
    pub fn earn(amount: Tokens, source: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            action: ActivityAction::Earn,
            amount,
            source: source.into(),
            timestamp,
        }
    }

    pub fn spend(amount: Tokens, source: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            action: ActivityAction::Spend,
            amount,
            source: source.into(),
            timestamp,
        }
    }
}

/// Append `entry` and drop the oldest entries beyond `capacity`.
///
/// Returns the number of evicted entries.
pub fn push_bounded(
    log: &mut Vec<TokenActivityEntry>,
    entry: TokenActivityEntry,
    capacity: usize,
) -> usize {
    log.push(entry);
    let overflow = log.len().saturating_sub(capacity);
    if overflow > 0 {
        log.drain(..overflow);
    }
    overflow
}

/// Total tokens spent on the local calendar `date`, as `clock` sees it.
pub fn spent_on(log: &[TokenActivityEntry], date: CalendarDate, clock: &dyn Clock) -> Tokens {
    log.iter()
        .filter(|e| e.action == ActivityAction::Spend && clock.local_date(e.timestamp) == date)
        .map(|e| e.amount)
        .sum()
}

// ---------------------------------------------------------------------------
// Anomaly detection
// ---------------------------------------------------------------------------

/// Thresholds for the anomaly rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyThresholds {
    pub burst: usize,
    pub repeat: usize,
    pub window: Duration,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            burst: BURST_THRESHOLD,
            repeat: REPEAT_THRESHOLD,
            window: Duration::seconds(ANOMALY_WINDOW_SECS),
        }
    }
}

/// An observational abuse signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum AnomalySignal {
    /// Too many earns in the window.
    BurstDetected { count: usize },
    /// One source dominates the window.
    RepeatedSourceDetected { source: String, count: usize },
}

/// Earn entries with `timestamp` in `(anchor - window, anchor]`.
pub fn earn_window(
    log: &[TokenActivityEntry],
    anchor: Timestamp,
    window: Duration,
) -> Vec<&TokenActivityEntry> {
    let start = anchor
        .checked_sub_signed(window)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
    log.iter()
        .filter(|e| e.action == ActivityAction::Earn)
        .filter(|e| e.timestamp > start && e.timestamp <= anchor)
        .collect()
}

/// Evaluate the burst and repetition rules over `window_entries`.
///
/// Signals are ordered: burst first, then repeated sources alphabetically.
pub fn evaluate(
    window_entries: &[&TokenActivityEntry],
    thresholds: &AnomalyThresholds,
) -> Vec<AnomalySignal> {
    let mut signals = Vec::new();

    if window_entries.len() > thresholds.burst {
        signals.push(AnomalySignal::BurstDetected {
            count: window_entries.len(),
        });
    }

    let mut by_source: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in window_entries {
        *by_source.entry(entry.source.as_str()).or_default() += 1;
    }
    for (source, count) in by_source {
        if count > thresholds.repeat {
            signals.push(AnomalySignal::RepeatedSourceDetected {
                source: source.to_string(),
                count,
            });
        }
    }

    signals
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};

    fn at(minute: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
    }

    #[test]
    fn push_bounded_evicts_oldest_first() {
        let mut log = Vec::new();
        for i in 0..150u32 {
            push_bounded(&mut log, TokenActivityEntry::earn(i + 1, "modal", at(0)), 100);
        }
        assert_eq!(log.len(), 100);
        assert_eq!(log.first().unwrap().amount, 51);
        assert_eq!(log.last().unwrap().amount, 150);
    }

    #[test]
    fn burst_fires_for_eleven_distinct_sources() {
        let log: Vec<_> = (0..11)
            .map(|i| TokenActivityEntry::earn(1, format!("source_{i}"), at(i)))
            .collect();
        let window = earn_window(&log, at(10), Duration::hours(1));
        let signals = evaluate(&window, &AnomalyThresholds::default());

        assert_eq!(signals, vec![AnomalySignal::BurstDetected { count: 11 }]);
    }

    #[test]
    fn exactly_ten_earns_is_not_a_burst() {
        let log: Vec<_> = (0..10)
            .map(|i| TokenActivityEntry::earn(1, format!("s{i}"), at(i)))
            .collect();
        let window = earn_window(&log, at(9), Duration::hours(1));
        assert!(evaluate(&window, &AnomalyThresholds::default()).is_empty());
    }

    #[test]
    fn repetition_fires_above_five_per_source() {
        let mut log: Vec<_> = (0..6)
            .map(|i| TokenActivityEntry::earn(1, "ad_reward", at(i)))
            .collect();
        log.push(TokenActivityEntry::earn(1, "modal", at(7)));

        let window = earn_window(&log, at(7), Duration::hours(1));
        let signals = evaluate(&window, &AnomalyThresholds::default());
        assert_eq!(
            signals,
            vec![AnomalySignal::RepeatedSourceDetected {
                source: "ad_reward".into(),
                count: 6
            }]
        );
    }

    #[test]
    fn window_excludes_old_entries_and_spends() {
        let mut log: Vec<_> = (0..8)
            .map(|_| TokenActivityEntry::earn(1, "ad_reward", at(-120)))
            .collect();
        log.extend((0..8).map(|i| TokenActivityEntry::spend(1, "ad_reward", at(i))));
        log.push(TokenActivityEntry::earn(1, "ad_reward", at(10)));

        let window = earn_window(&log, at(10), Duration::hours(1));
        assert_eq!(window.len(), 1);
        assert!(evaluate(&window, &AnomalyThresholds::default()).is_empty());
    }

    #[test]
    fn window_boundary_is_exclusive_at_one_hour() {
        let log = vec![
            TokenActivityEntry::earn(1, "a", at(0)),
            TokenActivityEntry::earn(1, "b", at(60)),
        ];
        let window = earn_window(&log, at(60), Duration::hours(1));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn oversized_window_covers_the_whole_log() {
        let log = vec![TokenActivityEntry::earn(1, "modal", at(-60 * 24 * 365))];
        assert_eq!(earn_window(&log, at(0), Duration::MAX).len(), 1);
    }

    #[test]
    fn spent_on_sums_only_spends_for_the_date() {
        let log = vec![
            TokenActivityEntry::spend(2, "generate", at(0)),
            TokenActivityEntry::spend(1, "polish", at(5)),
            TokenActivityEntry::earn(4, "modal", at(6)),
            TokenActivityEntry::spend(3, "generate", at(60 * 24)),
        ];
        let clock = ManualClock::new(at(0));
        assert_eq!(spent_on(&log, at(0).date_naive(), &clock), 3);
    }

    #[test]
    fn spent_on_groups_by_local_date() {
        // 23:30Z on the 18th is 08:30 on the 19th in UTC+9.
        let late = Utc.with_ymd_and_hms(2026, 10, 18, 23, 30, 0).unwrap();
        let log = vec![
            TokenActivityEntry::spend(2, "generate", late),
            TokenActivityEntry::spend(5, "image", late - Duration::hours(10)),
        ];
        let seoul = ManualClock::with_offset(late, FixedOffset::east_opt(9 * 3600).unwrap());
        let oct = |d| NaiveDate::from_ymd_opt(2026, 10, d).unwrap();

        assert_eq!(seoul.today(), oct(19));
        assert_eq!(spent_on(&log, oct(19), &seoul), 2);
        assert_eq!(spent_on(&log, oct(18), &seoul), 5);
    }

    #[test]
    fn entry_serializes_iso_timestamp() {
        let entry = TokenActivityEntry::earn(2, "daily_login", at(0));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "earn");
        assert_eq!(json["timestamp"], "2026-05-01T12:00:00Z");
    }
}
