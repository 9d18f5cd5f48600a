//! Push notification ingest.
//!
//! Converts a raw push payload into a [`BadgeNotification`] and hands it to
//! the [`BadgeCounter`]. Ingest never fails towards the push handler: every
//! error is logged and dropped.

use std::collections::HashMap;
use std::sync::Arc;

use posty_core::badge::{BadgeNotification, NotificationType};
use posty_core::clock::Clock;
use serde::Deserialize;

use crate::badge::BadgeCounter;

/// Push payload as delivered by the messaging service.
///
/// ```json
/// {"notification": {"title": "...", "body": "..."}, "data": {"type": "trend"}}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushMessage {
    #[serde(default)]
    pub notification: Option<PushContent>,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushContent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl PushMessage {
    /// Build the unread notification this push represents.
    pub fn to_notification(&self, clock: &dyn Clock) -> BadgeNotification {
        let (title, body) = match &self.notification {
            Some(content) => (
                content.title.clone().unwrap_or_default(),
                content.body.clone().unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        let kind = NotificationType::from_str_or_default(self.data.get("type").map(String::as_str));
        BadgeNotification::new(title, body, kind, clock.now())
    }
}

/// Feeds received pushes into the badge counter.
pub struct NotificationIngest {
    badges: Arc<BadgeCounter>,
    clock: Arc<dyn Clock>,
}

impl NotificationIngest {
    pub fn new(badges: Arc<BadgeCounter>, clock: Arc<dyn Clock>) -> Self {
        Self { badges, clock }
    }

    /// Record `raw` as a new unread notification.
    pub async fn handle_push_notification(&self, raw: PushMessage) {
        let notification = raw.to_notification(&*self.clock);
        let id = notification.id.clone();
        let kind = notification.kind;

        match self.badges.increment(Some(notification)).await {
            Ok(count) => {
                tracing::info!(id = %id, kind = kind.as_str(), count, "Push notification received");
            }
            Err(e) => {
                tracing::error!(error = %e, id = %id, "Failed to record push notification");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use posty_core::clock::ManualClock;

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 18, 8, 30, 0).unwrap())
    }

    #[test]
    fn full_payload_is_mapped() {
        let raw: PushMessage = serde_json::from_str(
            r#"{"notification":{"title":"New trend","body":"Try it"},"data":{"type":"trend"}}"#,
        )
        .unwrap();
        let n = raw.to_notification(&clock());
        assert_eq!(n.title, "New trend");
        assert_eq!(n.body, "Try it");
        assert_eq!(n.kind, NotificationType::Trend);
        assert!(!n.is_read);
        assert_eq!(n.timestamp, clock().now());
    }

    #[test]
    fn missing_fields_fall_back() {
        let raw: PushMessage = serde_json::from_str(r#"{"data":{"type":"promo"}}"#).unwrap();
        let n = raw.to_notification(&clock());
        assert_eq!(n.title, "");
        assert_eq!(n.body, "");
        assert_eq!(n.kind, NotificationType::Mission);

        let empty: PushMessage = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.to_notification(&clock()).kind, NotificationType::Mission);
    }

    #[test]
    fn ids_are_unique() {
        let raw = PushMessage::default();
        let c = clock();
        assert_ne!(raw.to_notification(&c).id, raw.to_notification(&c).id);
    }
}
