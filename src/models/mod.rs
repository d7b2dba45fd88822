use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Notification category enumeration
///
/// Drives presentation styling only (icon/color of the bell entry and
/// toast); it has no behavioral effect on synchronization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    /// Informational message
    Info,
    /// Completed action (booking confirmed, payment accepted)
    Success,
    /// Something needs attention soon
    Warning,
    /// Failed action
    Error,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Info => "info",
            NotificationCategory::Success => "success",
            NotificationCategory::Warning => "warning",
            NotificationCategory::Error => "error",
        }
    }

    /// Parse a category string from the wire, falling back to `Info` for
    /// anything unrecognized rather than dropping the notification.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "success" => NotificationCategory::Success,
            "warning" => NotificationCategory::Warning,
            "error" => NotificationCategory::Error,
            _ => NotificationCategory::Info,
        }
    }
}

impl Default for NotificationCategory {
    fn default() -> Self {
        NotificationCategory::Info
    }
}

/// Core notification model
///
/// `id` is server-assigned and opaque; it is the de-duplication and merge
/// key within a user's list. `created_at` is used for display ordering and
/// relative-time rendering only, never for merge ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,

    /// Notification title
    pub title: String,

    /// Notification body/message
    pub message: String,

    /// Category, lowercase on the wire (`notification_type` on push frames)
    #[serde(rename = "notification_type", alias = "type", default)]
    pub category: NotificationCategory,

    /// Read status, monotonic false -> true except via full resynchronization
    #[serde(default)]
    pub is_read: bool,

    /// Server-assigned creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Render a creation timestamp relative to `now` for list display.
///
/// Under a minute: "Just now"; under an hour: minutes; under a day: hours;
/// older entries fall back to the calendar date.
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(created_at);

    if diff < Duration::minutes(1) {
        "Just now".to_string()
    } else if diff < Duration::hours(1) {
        format!("{}m ago", diff.num_minutes())
    } else if diff < Duration::days(1) {
        format!("{}h ago", diff.num_hours())
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn notification_json() -> &'static str {
        r#"{
            "id": "n-42",
            "title": "Booking confirmed",
            "message": "Your hotel booking is confirmed",
            "notification_type": "success",
            "is_read": false,
            "created_at": "2026-08-01T10:00:00Z"
        }"#
    }

    #[test]
    fn test_category_parse_known_values() {
        assert_eq!(
            NotificationCategory::parse("success"),
            NotificationCategory::Success
        );
        assert_eq!(
            NotificationCategory::parse("WARNING"),
            NotificationCategory::Warning
        );
        assert_eq!(
            NotificationCategory::parse("error"),
            NotificationCategory::Error
        );
        assert_eq!(
            NotificationCategory::parse("info"),
            NotificationCategory::Info
        );
    }

    #[test]
    fn test_category_parse_unknown_falls_back_to_info() {
        assert_eq!(
            NotificationCategory::parse("booking_update"),
            NotificationCategory::Info
        );
        assert_eq!(NotificationCategory::parse(""), NotificationCategory::Info);
    }

    #[test]
    fn test_notification_deserialization() {
        let n: Notification = serde_json::from_str(notification_json()).unwrap();
        assert_eq!(n.id, "n-42");
        assert_eq!(n.category, NotificationCategory::Success);
        assert!(!n.is_read);
    }

    #[test]
    fn test_notification_accepts_type_alias_and_defaults() {
        // Bulk-fetch payloads use "type"; missing read flag defaults false.
        let json = r#"{
            "id": "n-1",
            "title": "t",
            "message": "m",
            "type": "warning",
            "created_at": "2026-08-01T10:00:00Z"
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.category, NotificationCategory::Warning);
        assert!(!n.is_read);
    }

    #[test]
    fn test_relative_time_thresholds() {
        let created = Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap();

        let now = created + Duration::seconds(30);
        assert_eq!(relative_time(created, now), "Just now");

        let now = created + Duration::minutes(5);
        assert_eq!(relative_time(created, now), "5m ago");

        let now = created + Duration::hours(3);
        assert_eq!(relative_time(created, now), "3h ago");

        let now = created + Duration::days(2);
        assert_eq!(relative_time(created, now), "2026-08-01");
    }
}
