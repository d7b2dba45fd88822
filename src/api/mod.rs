/// REST collaborator for the notification list
///
/// The bulk snapshot and mutation-confirmation endpoints are external to
/// this subsystem; they are consumed here as a contract. The trait seam
/// lets tests install a recording mock instead of a live server.
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::Result;
use crate::models::Notification;

/// Bulk snapshot payload: full list plus the server's unread count
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationListResponse {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnreadCountResponse {
    #[serde(default)]
    pub unread_count: u64,
}

/// Contract for the notification endpoints
///
/// Mutation endpoints report success/failure only; a failure is logged by
/// the caller and the optimistic local state is kept as-is.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch the full list and unread count.
    async fn fetch_notifications(&self) -> Result<NotificationListResponse>;

    /// Fetch the unread count only.
    async fn fetch_unread_count(&self) -> Result<u64>;

    /// Confirm one notification as read.
    async fn mark_read(&self, id: &str) -> Result<()>;

    /// Confirm every notification as read.
    async fn mark_all_read(&self) -> Result<()>;

    /// Delete one notification.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// HTTP implementation against the application backend
pub struct RestNotificationApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestNotificationApi {
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl NotificationApi for RestNotificationApi {
    async fn fetch_notifications(&self) -> Result<NotificationListResponse> {
        let response = self
            .http
            .get(self.url("/api/notifications"))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn fetch_unread_count(&self) -> Result<u64> {
        let response = self
            .http
            .get(self.url("/api/notifications/unread-count"))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        let body: UnreadCountResponse = response.json().await?;
        Ok(body.unread_count)
    }

    async fn mark_read(&self, id: &str) -> Result<()> {
        self.http
            .post(self.url(&format!("/api/notifications/{id}/read")))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn mark_all_read(&self) -> Result<()> {
        self.http
            .post(self.url("/api/notifications/mark-all-read"))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.http
            .delete(self.url(&format!("/api/notifications/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_list_response_deserialization() {
        let json = r#"{
            "notifications": [
                {
                    "id": "n1",
                    "title": "t",
                    "message": "m",
                    "notification_type": "info",
                    "is_read": true,
                    "created_at": "2026-08-01T10:00:00Z"
                }
            ],
            "unread_count": 3
        }"#;
        let body: NotificationListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.notifications.len(), 1);
        assert_eq!(body.unread_count, 3);
    }

    #[test]
    fn test_list_response_tolerates_missing_fields() {
        let body: NotificationListResponse = serde_json::from_str("{}").unwrap();
        assert!(body.notifications.is_empty());
        assert_eq!(body.unread_count, 0);
    }

    #[test]
    fn test_unread_count_response_deserialization() {
        let body: UnreadCountResponse =
            serde_json::from_str(r#"{"unread_count": 12}"#).unwrap();
        assert_eq!(body.unread_count, 12);
    }

    #[test]
    fn test_url_building_trims_trailing_slash() {
        let mut config = Config::default().api;
        config.base_url = "http://localhost:8000/".to_string();
        let api = RestNotificationApi::new(&config, "tok").unwrap();
        assert_eq!(
            api.url("/api/notifications"),
            "http://localhost:8000/api/notifications"
        );
    }
}
