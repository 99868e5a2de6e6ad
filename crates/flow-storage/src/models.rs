use serde::{Deserialize, Serialize};

/// Namespace holding the block list
pub const APP_BLOCKING_PREFS: &str = "app_blocking";
/// Key of the blocked-package string set
pub const BLOCKED_APPS_KEY: &str = "blocked_apps";
/// Namespace holding pending reminder records
pub const SESSION_NOTIFICATIONS_PREFS: &str = "session_notifications";
/// Prefix of every pending reminder key
pub const NOTIFICATION_KEY_PREFIX: &str = "notif_";

/// Pending reminder - persisted between scheduling and firing so alarms survive restarts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    pub notification_id: i32,
    pub session_id: String,
    pub title: String,
    pub body: String,
    pub offset_minutes: i32,
    /// Fire time in epoch milliseconds
    pub scheduled_time: i64,
}

impl PendingNotification {
    /// Storage key for a notification id
    #[must_use]
    pub fn storage_key(notification_id: i32) -> String {
        format!("{NOTIFICATION_KEY_PREFIX}{notification_id}")
    }

    #[must_use]
    pub fn key(&self) -> String {
        Self::storage_key(self.notification_id)
    }

    /// Serialize to the persisted JSON form
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse the persisted JSON form
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a complete record
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Whether the fire time is strictly after `now_millis`
    #[must_use]
    pub const fn is_due_after(&self, now_millis: i64) -> bool {
        self.scheduled_time > now_millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PendingNotification {
        PendingNotification {
            notification_id: 7,
            session_id: String::from("session-1"),
            title: String::from("Deep work"),
            body: String::from("Starts in 10 minutes"),
            offset_minutes: 10,
            scheduled_time: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_storage_key_uses_prefix() {
        assert_eq!(PendingNotification::storage_key(42), "notif_42");
        assert_eq!(sample().key(), "notif_7");
    }

    #[test]
    fn test_json_uses_persisted_field_names() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        for field in [
            "notification_id",
            "session_id",
            "title",
            "body",
            "offset_minutes",
            "scheduled_time",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }

    #[test]
    fn test_from_json_rejects_incomplete_record() {
        assert!(PendingNotification::from_json(r#"{"notification_id": 1}"#).is_err());
        assert!(PendingNotification::from_json("garbage").is_err());
    }

    #[test]
    fn test_is_due_after() {
        let record = sample();
        assert!(record.is_due_after(record.scheduled_time - 1));
        assert!(!record.is_due_after(record.scheduled_time));
    }
}
