use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub websocket: WebSocketConfig,
    pub toast: ToastConfig,
}

/// REST collaborator endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Push channel tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    pub base_url: String,
    /// Outbound keepalive ping cadence while the channel is open
    pub heartbeat_interval_secs: u64,
    /// Backoff ramp: delay = base * attempt, capped at max
    pub reconnect_base_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    /// Attempts before the manager parks itself in Failed
    pub max_reconnect_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToastConfig {
    /// Display duration before a toast auto-expires
    pub ttl_secs: u64,
}

impl WebSocketConfig {
    /// Compute the reconnect delay for the given attempt number.
    ///
    /// Linear ramp capped at `reconnect_max_delay_ms`, so delays are
    /// non-decreasing in the attempt counter.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let ms = self
            .reconnect_base_delay_ms
            .saturating_mul(u64::from(attempt))
            .min(self.reconnect_max_delay_ms);
        Duration::from_millis(ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

impl ToastConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());
        let ws_base_url = env::var("WS_BASE_URL")
            .ok()
            .or_else(|| api_base_url.strip_prefix("http").map(|rest| format!("ws{rest}")))
            .ok_or_else(|| AppError::Config("WS_BASE_URL is not set".to_string()))?;

        Ok(Config {
            api: ApiConfig {
                base_url: api_base_url,
                timeout_secs: env::var("API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            },
            websocket: WebSocketConfig {
                base_url: ws_base_url,
                heartbeat_interval_secs: env::var("WS_HEARTBEAT_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(25),
                reconnect_base_delay_ms: env::var("WS_RECONNECT_BASE_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
                reconnect_max_delay_ms: env::var("WS_RECONNECT_MAX_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15_000),
                max_reconnect_attempts: env::var("WS_MAX_RECONNECT_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
            },
            toast: ToastConfig {
                ttl_secs: env::var("TOAST_TTL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: 10,
            },
            websocket: WebSocketConfig {
                base_url: "ws://localhost:8000".to_string(),
                heartbeat_interval_secs: 25,
                reconnect_base_delay_ms: 5000,
                reconnect_max_delay_ms: 15_000,
                max_reconnect_attempts: 3,
            },
            toast: ToastConfig { ttl_secs: 5 },
        }
    }
}
