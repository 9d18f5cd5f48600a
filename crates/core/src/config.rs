//! Economy configuration loaded from environment variables.

use chrono::Duration;

use crate::account::{INITIAL_GRANT, MAX_DAILY_EARNED};
use crate::activity::{
    AnomalyThresholds, ACTIVITY_LOG_CAPACITY, ANOMALY_WINDOW_SECS, BURST_THRESHOLD,
    REPEAT_THRESHOLD,
};
use crate::badge::NOTIFICATION_LIST_CAPACITY;
use crate::error::CoreError;
use crate::types::Tokens;

/// Tunables for the token economy and badge governor.
///
/// Defaults match the shipped app. Every field can be overridden from the
/// environment via [`EconomyConfig::from_env`].
#[derive(Debug, Clone)]
pub struct EconomyConfig {
    /// Daily cap on reward-driven earnings.
    pub max_daily_earned: Tokens,
    /// Tokens granted to a brand-new account.
    pub initial_grant: Tokens,
    /// Entries retained in the activity log.
    pub activity_log_capacity: usize,
    /// Entries retained in the notification display list.
    pub notification_capacity: usize,
    /// Burst / repetition thresholds and window.
    pub anomaly: AnomalyThresholds,
    /// When `true`, the earn governor withholds grants while the recent
    /// window is flagged. Off by default: signals are observational.
    pub enforce_anomaly_signals: bool,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            max_daily_earned: MAX_DAILY_EARNED,
            initial_grant: INITIAL_GRANT,
            activity_log_capacity: ACTIVITY_LOG_CAPACITY,
            notification_capacity: NOTIFICATION_LIST_CAPACITY,
            anomaly: AnomalyThresholds::default(),
            enforce_anomaly_signals: false,
        }
    }
}

impl EconomyConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default |
    /// |---------------------------------|---------|
    /// | `POSTY_MAX_DAILY_EARNED`        | `20`    |
    /// | `POSTY_INITIAL_GRANT`           | `10`    |
    /// | `POSTY_ACTIVITY_LOG_CAPACITY`   | `100`   |
    /// | `POSTY_NOTIFICATION_CAPACITY`   | `50`    |
    /// | `POSTY_BURST_THRESHOLD`         | `10`    |
    /// | `POSTY_REPEAT_THRESHOLD`        | `5`     |
    /// | `POSTY_ANOMALY_WINDOW_SECS`     | `3600`  |
    /// | `POSTY_ENFORCE_ANOMALY_SIGNALS` | `false` |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let defaults = Self::default();

        let window_secs: i64 = parse_or(&lookup, "POSTY_ANOMALY_WINDOW_SECS", ANOMALY_WINDOW_SECS)?;
        if window_secs <= 0 {
            return Err(CoreError::Config(
                "POSTY_ANOMALY_WINDOW_SECS must be positive".into(),
            ));
        }
        let window = Duration::try_seconds(window_secs).ok_or_else(|| {
            CoreError::Config(format!(
                "POSTY_ANOMALY_WINDOW_SECS out of range: {window_secs}"
            ))
        })?;

        let config = Self {
            max_daily_earned: parse_or(&lookup, "POSTY_MAX_DAILY_EARNED", defaults.max_daily_earned)?,
            initial_grant: parse_or(&lookup, "POSTY_INITIAL_GRANT", defaults.initial_grant)?,
            activity_log_capacity: parse_or(
                &lookup,
                "POSTY_ACTIVITY_LOG_CAPACITY",
                defaults.activity_log_capacity,
            )?,
            notification_capacity: parse_or(
                &lookup,
                "POSTY_NOTIFICATION_CAPACITY",
                defaults.notification_capacity,
            )?,
            anomaly: AnomalyThresholds {
                burst: parse_or(&lookup, "POSTY_BURST_THRESHOLD", BURST_THRESHOLD)?,
                repeat: parse_or(&lookup, "POSTY_REPEAT_THRESHOLD", REPEAT_THRESHOLD)?,
                window,
            },
            enforce_anomaly_signals: parse_or(
                &lookup,
                "POSTY_ENFORCE_ANOMALY_SIGNALS",
                defaults.enforce_anomaly_signals,
            )?,
        };

        if config.activity_log_capacity == 0 || config.notification_capacity == 0 {
            return Err(CoreError::Config("capacities must be at least 1".into()));
        }

        Ok(config)
    }
}

/// Parse `key` if present, otherwise return `default`.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError>
where
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| {
            CoreError::Config(format!("{key} has an invalid value '{raw}'"))
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = EconomyConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.max_daily_earned, 20);
        assert_eq!(config.activity_log_capacity, 100);
        assert_eq!(config.notification_capacity, 50);
        assert_eq!(config.anomaly.window, Duration::hours(1));
        assert!(!config.enforce_anomaly_signals);
    }

    #[test]
    fn overrides_are_applied() {
        let config = EconomyConfig::from_lookup(lookup(&[
            ("POSTY_MAX_DAILY_EARNED", "30"),
            ("POSTY_BURST_THRESHOLD", "4"),
            ("POSTY_ENFORCE_ANOMALY_SIGNALS", "true"),
        ]))
        .unwrap();
        assert_eq!(config.max_daily_earned, 30);
        assert_eq!(config.anomaly.burst, 4);
        assert!(config.enforce_anomaly_signals);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EconomyConfig::from_lookup(lookup(&[("POSTY_MAX_DAILY_EARNED", "-1")])).is_err());
        assert!(EconomyConfig::from_lookup(lookup(&[("POSTY_ANOMALY_WINDOW_SECS", "0")])).is_err());
        assert!(matches!(
            EconomyConfig::from_lookup(lookup(&[(
                "POSTY_ANOMALY_WINDOW_SECS",
                "9223372036854775807"
            )])),
            Err(CoreError::Config(_))
        ));
        assert!(
            EconomyConfig::from_lookup(lookup(&[("POSTY_NOTIFICATION_CAPACITY", "0")])).is_err()
        );
    }
}
