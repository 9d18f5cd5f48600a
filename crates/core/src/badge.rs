//! Unread-badge state: an authoritative counter plus a bounded display list.
//!
//! The counter is the durable truth. The notification list is a display
//! cache capped at [`NOTIFICATION_LIST_CAPACITY`] entries; evicting an unread
//! entry from it never changes the count.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of notifications kept in the display list.
pub const NOTIFICATION_LIST_CAPACITY: usize = 50;

// ---------------------------------------------------------------------------
// NotificationType
// ---------------------------------------------------------------------------

/// Category of a badge notification; also names the screen that reads it.
///
/// Deserialization is lenient: stored lists may carry whatever `type` a push
/// payload sent, so unknown or null values read back as `Mission`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    Mission,
    Trend,
    Achievement,
    Tip,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::Mission => "mission",
            NotificationType::Trend => "trend",
            NotificationType::Achievement => "achievement",
            NotificationType::Tip => "tip",
        }
    }

    /// Parse a push payload's `type`, defaulting to `Mission` when unknown.
    pub fn from_str_or_default(s: Option<&str>) -> Self {
        s.and_then(|s| Self::parse(s).ok()).unwrap_or_default()
    }

    /// Strict parse.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mission" => Ok(NotificationType::Mission),
            "trend" => Ok(NotificationType::Trend),
            "achievement" => Ok(NotificationType::Achievement),
            "tip" => Ok(NotificationType::Tip),
            other => Err(CoreError::Validation(format!(
                "Unknown notification type '{other}'"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_str_or_default(raw.as_deref()))
    }
}

// ---------------------------------------------------------------------------
// BadgeNotification
// ---------------------------------------------------------------------------

/// A notification shown in the in-app list.
///
/// Read state is one-way: `Unseen -> Read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    /// Epoch milliseconds on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: Timestamp,
    pub is_read: bool,
}

impl BadgeNotification {
    /// An unread notification received at `timestamp` with a time-derived id.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        kind: NotificationType,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            title: title.into(),
            body: body.into(),
            kind,
            timestamp,
            is_read: false,
        }
    }
}

// ---------------------------------------------------------------------------
// BadgeState
// ---------------------------------------------------------------------------

/// Counter plus newest-first notification list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeState {
    pub count: u32,
    pub notifications: Vec<BadgeNotification>,
}

impl BadgeState {
    /// Bump the count and, if given, prepend the notification.
    ///
    /// Returns the entries evicted beyond `capacity`. Eviction does not
    /// touch the count.
    pub fn increment(
        &mut self,
        notification: Option<BadgeNotification>,
        capacity: usize,
    ) -> Vec<BadgeNotification> {
        self.count = self.count.saturating_add(1);
        match notification {
            Some(n) => {
                self.notifications.insert(0, n);
                if self.notifications.len() > capacity {
                    self.notifications.split_off(capacity)
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        }
    }

    /// `count = max(0, count - by)`. Returns `true` if the count changed.
    pub fn decrement(&mut self, by: u32) -> bool {
        let before = self.count;
        self.count = self.count.saturating_sub(by);
        self.count != before
    }

    /// Mark one entry read. Returns `true` if an unread entry was flipped
    /// (and the count decremented); unknown or already-read ids are no-ops.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self
            .notifications
            .iter_mut()
            .find(|n| n.id == id && !n.is_read)
        {
            Some(n) => {
                n.is_read = true;
                self.decrement(1);
                true
            }
            None => false,
        }
    }

    /// Zero the count and mark every entry read.
    pub fn clear_all(&mut self) {
        self.count = 0;
        for n in &mut self.notifications {
            n.is_read = true;
        }
    }

    /// Mark every unread entry of `kind` read, decrementing once per entry.
    ///
    /// Returns the number of entries flipped.
    pub fn mark_kind_read(&mut self, kind: NotificationType) -> u32 {
        let mut flipped = 0u32;
        for n in self
            .notifications
            .iter_mut()
            .filter(|n| n.kind == kind && !n.is_read)
        {
            n.is_read = true;
            flipped += 1;
        }
        self.decrement(flipped);
        flipped
    }

    pub fn unread(&self) -> impl Iterator<Item = &BadgeNotification> {
        self.notifications.iter().filter(|n| !n.is_read)
    }

    pub fn unread_in_list(&self) -> usize {
        self.unread().count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn notification(kind: NotificationType) -> BadgeNotification {
        BadgeNotification::new("title", "body", kind, Utc::now())
    }

    fn receive(state: &mut BadgeState, kind: NotificationType) -> String {
        let n = notification(kind);
        let id = n.id.clone();
        state.increment(Some(n), NOTIFICATION_LIST_CAPACITY);
        id
    }

    #[test]
    fn receive_read_then_clear() {
        let mut state = BadgeState::default();
        let first = receive(&mut state, NotificationType::Mission);
        receive(&mut state, NotificationType::Trend);
        receive(&mut state, NotificationType::Tip);
        assert_eq!(state.count, 3);

        assert!(state.mark_read(&first));
        assert_eq!(state.count, 2);

        state.clear_all();
        assert_eq!(state.count, 0);
        assert_eq!(state.notifications.len(), 3);
        assert!(state.notifications.iter().all(|n| n.is_read));
    }

    #[test]
    fn mark_read_is_noop_for_unknown_or_read() {
        let mut state = BadgeState::default();
        let id = receive(&mut state, NotificationType::Mission);
        assert!(!state.mark_read("missing"));
        assert!(state.mark_read(&id));
        assert!(!state.mark_read(&id));
        assert_eq!(state.count, 0);
    }

    #[test]
    fn decrement_floors_at_zero() {
        let mut state = BadgeState::default();
        state.increment(None, NOTIFICATION_LIST_CAPACITY);
        assert!(state.decrement(5));
        assert_eq!(state.count, 0);
        assert!(!state.decrement(1));
    }

    #[test]
    fn list_eviction_keeps_count() {
        let mut state = BadgeState::default();
        let oldest = receive(&mut state, NotificationType::Mission);
        for _ in 0..NOTIFICATION_LIST_CAPACITY {
            receive(&mut state, NotificationType::Trend);
        }
        assert_eq!(state.notifications.len(), NOTIFICATION_LIST_CAPACITY);
        assert_eq!(state.count, NOTIFICATION_LIST_CAPACITY as u32 + 1);
        assert!(state.notifications.iter().all(|n| n.id != oldest));
    }

    #[test]
    fn increment_returns_evicted_entries() {
        let mut state = BadgeState::default();
        state.increment(Some(notification(NotificationType::Tip)), 1);
        let evicted = state.increment(Some(notification(NotificationType::Trend)), 1);
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].kind, NotificationType::Tip);
        assert_eq!(state.notifications[0].kind, NotificationType::Trend);
    }

    #[test]
    fn mark_kind_read_decrements_per_entry() {
        let mut state = BadgeState::default();
        receive(&mut state, NotificationType::Trend);
        receive(&mut state, NotificationType::Mission);
        receive(&mut state, NotificationType::Trend);

        assert_eq!(state.mark_kind_read(NotificationType::Trend), 2);
        assert_eq!(state.count, 1);
        assert_eq!(state.mark_kind_read(NotificationType::Trend), 0);
        assert_eq!(state.count, 1);
    }

    /// Counter matches unread entries across a mixed sequence without eviction.
    #[test]
    fn count_tracks_unread_without_eviction() {
        let mut state = BadgeState::default();
        let mut ids = Vec::new();
        for i in 0..20 {
            let kind = if i % 3 == 0 {
                NotificationType::Achievement
            } else {
                NotificationType::Mission
            };
            ids.push(receive(&mut state, kind));
            if i % 4 == 0 {
                state.mark_read(&ids[i / 2]);
            }
            if i == 12 {
                state.mark_kind_read(NotificationType::Achievement);
            }
            assert_eq!(state.count as usize, state.unread_in_list());
        }
        state.clear_all();
        assert_eq!(state.count as usize, state.unread_in_list());
    }

    #[test]
    fn type_parse_defaults_to_mission() {
        assert_eq!(
            NotificationType::from_str_or_default(Some("trend")),
            NotificationType::Trend
        );
        assert_eq!(
            NotificationType::from_str_or_default(Some("promo")),
            NotificationType::Mission
        );
        assert_eq!(
            NotificationType::from_str_or_default(None),
            NotificationType::Mission
        );
    }

    #[test]
    fn notification_wire_format() {
        let mut n = notification(NotificationType::Achievement);
        n.timestamp = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "achievement");
        assert_eq!(json["isRead"], false);
        assert_eq!(json["timestamp"], 1_767_225_600_000i64);
    }

    #[test]
    fn stored_list_with_unknown_types_still_loads() {
        let raw = r#"[
            {"id":"a","title":"Sale","body":"","type":"promo","timestamp":1767225600000,"isRead":false},
            {"id":"b","title":"New trend","body":"","type":"trend","timestamp":1767225600000,"isRead":true},
            {"id":"c","title":"Untyped","body":"","timestamp":1767225600000,"isRead":false}
        ]"#;
        let list: Vec<BadgeNotification> = serde_json::from_str(raw).unwrap();
        let kinds: Vec<_> = list.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationType::Mission,
                NotificationType::Trend,
                NotificationType::Mission
            ]
        );
    }
}
