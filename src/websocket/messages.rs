/// Wire message types for the push channel
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outbound keepalive payload. The server does not interpret it beyond
/// keeping intermediary network devices from closing an idle channel.
pub const HEARTBEAT_PING: &str = "ping";

/// Frames the server delivers over the push channel
///
/// Anything that fails to decode into one of these is a protocol failure:
/// logged and discarded at the channel boundary without a state change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Sent once per successful connection with the authoritative unread
    /// count known to the server at connect time.
    Init { unread_count: u64 },

    /// One per new notification.
    Notification {
        id: String,
        title: String,
        message: String,
        #[serde(default)]
        notification_type: Option<String>,
        #[serde(default = "Utc::now")]
        created_at: DateTime<Utc>,
    },

    /// Server liveness ping, no payload semantics.
    Heartbeat,
}

impl ServerFrame {
    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
