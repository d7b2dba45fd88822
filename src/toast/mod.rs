/// Toast presentation queue
///
/// A short-lived view over newly arrived notifications, decoupled from the
/// store's lifecycle: a notification can be marked read or deleted while
/// its toast is still on screen. One toast is visible at a time; a new
/// arrival replaces the current one. Expiry or dismissal never touches the
/// underlying notification's read state.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;
use tracing::trace;

use crate::models::Notification;

#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    Shown(Notification),
    Dismissed(String),
    Expired(String),
}

/// The currently displayed toast
#[derive(Debug, Clone)]
pub struct ToastEntry {
    pub notification: Notification,
    pub expires_at: Instant,
    generation: u64,
}

#[derive(Default)]
struct ToastState {
    current: Option<ToastEntry>,
    generation: u64,
    subscribers: Vec<mpsc::UnboundedSender<ToastEvent>>,
    shutdown: bool,
}

impl ToastState {
    fn emit(&mut self, event: ToastEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<RwLock<ToastState>>,
    ttl: Duration,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ToastState::default())),
            ttl,
        }
    }

    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<ToastEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().await.subscribers.push(tx);
        rx
    }

    pub async fn current(&self) -> Option<Notification> {
        self.inner
            .read()
            .await
            .current
            .as_ref()
            .map(|entry| entry.notification.clone())
    }

    /// Display a toast, replacing whatever is currently shown.
    ///
    /// Schedules the TTL expiry; the timer is generation-checked so a
    /// stale timer for a replaced or dismissed toast never clears a newer
    /// one.
    pub async fn show(&self, notification: Notification) {
        let generation;
        {
            let mut state = self.inner.write().await;
            if state.shutdown {
                return;
            }
            state.generation += 1;
            generation = state.generation;
            state.current = Some(ToastEntry {
                notification: notification.clone(),
                expires_at: Instant::now() + self.ttl,
                generation,
            });
            state.emit(ToastEvent::Shown(notification));
        }

        let inner = Arc::clone(&self.inner);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = inner.write().await;
            if state.shutdown {
                return;
            }
            match &state.current {
                Some(entry) if entry.generation == generation => {
                    let id = entry.notification.id.clone();
                    trace!(%id, "toast expired");
                    state.current = None;
                    state.emit(ToastEvent::Expired(id));
                }
                _ => {}
            }
        });
    }

    /// Explicit early dismissal by the user.
    pub async fn dismiss(&self) {
        let mut state = self.inner.write().await;
        if let Some(entry) = state.current.take() {
            let id = entry.notification.id.clone();
            state.emit(ToastEvent::Dismissed(id));
        }
    }

    /// Teardown: drop the current toast and disarm every pending timer.
    pub async fn shutdown(&self) {
        let mut state = self.inner.write().await;
        state.shutdown = true;
        state.current = None;
        state.subscribers.clear();
    }
}
