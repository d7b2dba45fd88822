pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;
pub mod toast;
pub mod websocket;

pub use api::{NotificationApi, RestNotificationApi};
pub use client::NotificationClient;
pub use config::Config;
pub use error::{AppError, Result};
pub use models::{Notification, NotificationCategory};
pub use store::{NotificationStore, StoreEvent};
pub use toast::{ToastEvent, ToastQueue};
pub use websocket::{ConnectionEvent, ConnectionManager, ConnectionState, ServerFrame};
