/// Notification client session
///
/// Owns the store, the toast queue, the REST collaborator, and the push
/// channel for one authenticated session. Constructed on session start,
/// torn down on logout; tests can construct independent instances with a
/// mock collaborator.
use std::sync::Arc;

use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::api::{NotificationApi, RestNotificationApi};
use crate::config::Config;
use crate::error::Result;
use crate::models::{Notification, NotificationCategory};
use crate::store::{NotificationStore, StoreEvent};
use crate::toast::{ToastEvent, ToastQueue};
use crate::websocket::{ConnectionEvent, ConnectionManager, ConnectionState, ServerFrame};

pub struct NotificationClient {
    token: String,
    api: Arc<dyn NotificationApi>,
    store: Arc<RwLock<NotificationStore>>,
    toasts: ToastQueue,
    connection: ConnectionManager,
    connected: Arc<watch::Sender<bool>>,
    event_loop: Option<JoinHandle<()>>,
}

impl NotificationClient {
    /// Build a client against the live REST collaborator.
    pub fn new(config: Config, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let api = Arc::new(RestNotificationApi::new(&config.api, token.clone())?);
        Ok(Self::with_api(config, token, api))
    }

    /// Build a client with a custom collaborator (used by tests).
    pub fn with_api(config: Config, token: impl Into<String>, api: Arc<dyn NotificationApi>) -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            token: token.into(),
            api,
            store: Arc::new(RwLock::new(NotificationStore::new())),
            toasts: ToastQueue::new(config.toast.ttl()),
            connection: ConnectionManager::new(config.websocket),
            connected: Arc::new(connected),
            event_loop: None,
        }
    }

    /// Session start: load the bulk snapshot, then open the push channel.
    ///
    /// A failed snapshot fetch is logged and does not block the channel;
    /// notifications are an auxiliary feature and the next successful
    /// fetch or init frame self-heals.
    pub async fn start(&mut self) -> Result<()> {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "initial notification fetch failed");
        }

        let events = self.connection.start(&self.token)?;
        let store = Arc::clone(&self.store);
        let toasts = self.toasts.clone();
        let connected = Arc::clone(&self.connected);
        self.event_loop = Some(tokio::spawn(event_loop(events, store, toasts, connected)));
        Ok(())
    }

    /// Re-run the bulk fetch and replace the list wholesale.
    pub async fn refresh(&self) -> Result<()> {
        let snapshot = self.api.fetch_notifications().await?;
        self.store
            .write()
            .await
            .load_snapshot(snapshot.notifications, snapshot.unread_count);
        Ok(())
    }

    /// Mark one notification read: optimistic local flip first, then the
    /// confirming round trip. A confirmation failure is logged and the
    /// local state intentionally kept (next snapshot corrects any drift).
    pub async fn mark_read(&self, id: &str) {
        self.store.write().await.mark_read(id);

        if let Err(e) = self.api.mark_read(id).await {
            warn!(error = %e, id, "mark-read confirmation failed");
        }
    }

    /// Mark everything read with the same optimistic contract.
    pub async fn mark_all_read(&self) {
        self.store.write().await.mark_all_read();

        if let Err(e) = self.api.mark_all_read().await {
            warn!(error = %e, "mark-all-read confirmation failed");
        }
    }

    /// Delete one notification immediately; the unread count is then
    /// corrected by an authoritative refresh rather than local arithmetic.
    pub async fn delete(&self, id: &str) {
        self.store.write().await.delete(id);

        if let Err(e) = self.api.delete(id).await {
            warn!(error = %e, id, "delete confirmation failed");
        }

        match self.api.fetch_unread_count().await {
            Ok(count) => self.store.write().await.set_unread_count(count),
            Err(e) => warn!(error = %e, "unread count refresh failed"),
        }
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.store.read().await.notifications().to_vec()
    }

    pub async fn unread_count(&self) -> u64 {
        self.store.read().await.unread_count()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Watch the boolean connected indicator (the only way transport
    /// failures are surfaced).
    pub fn connected_watch(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.connection.state().await
    }

    pub async fn subscribe_store(&self) -> mpsc::UnboundedReceiver<StoreEvent> {
        self.store.write().await.subscribe()
    }

    pub async fn subscribe_toasts(&self) -> mpsc::UnboundedReceiver<ToastEvent> {
        self.toasts.subscribe().await
    }

    pub async fn current_toast(&self) -> Option<Notification> {
        self.toasts.current().await
    }

    /// Dismissing a toast never touches the notification's read state.
    pub async fn dismiss_toast(&self) {
        self.toasts.dismiss().await;
    }

    /// Logout teardown: normal channel close, event loop drained, toast
    /// timers disarmed, list cleared. Never triggers reconnection.
    pub async fn shutdown(&mut self) {
        self.connection.shutdown().await;
        if let Some(task) = self.event_loop.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "event loop join failed");
            }
        }
        self.toasts.shutdown().await;
        self.store.write().await.clear();
        let _ = self.connected.send(false);
        info!("notification client shut down");
    }
}

/// Single consumer of channel events: every store mutation triggered by
/// the push path runs here to completion, one event at a time.
async fn event_loop(
    mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
    store: Arc<RwLock<NotificationStore>>,
    toasts: ToastQueue,
    connected: Arc<watch::Sender<bool>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            ConnectionEvent::Connected { unread_count } => {
                let _ = connected.send(true);
                // The init-carried count is applied before any push frame
                // delivered on the new channel, so it always wins over
                // state accumulated while disconnected.
                store.write().await.set_unread_count(unread_count);
            }
            ConnectionEvent::Frame(ServerFrame::Notification {
                id,
                title,
                message,
                notification_type,
                created_at,
            }) => {
                let notification = Notification {
                    id,
                    title,
                    message,
                    category: NotificationCategory::parse(
                        notification_type.as_deref().unwrap_or_default(),
                    ),
                    is_read: false,
                    created_at,
                };
                let inserted = store.write().await.ingest_push(notification.clone());
                if inserted {
                    toasts.show(notification).await;
                }
            }
            ConnectionEvent::Frame(frame) => trace!(?frame, "ignoring frame"),
            ConnectionEvent::Disconnected { will_retry } => {
                let _ = connected.send(false);
                if will_retry {
                    debug!("push channel down, reconnect scheduled");
                } else {
                    info!("push channel closed");
                }
            }
        }
    }
}
