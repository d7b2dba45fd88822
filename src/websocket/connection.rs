/// Push channel connection manager
///
/// Owns the lifecycle of the WebSocket channel: opening, heartbeating,
/// detecting failure, and retrying with bounded backoff. Emits typed
/// events upward; has no notion of notification semantics beyond decoding
/// frames at the channel boundary.
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use super::messages::{ServerFrame, HEARTBEAT_PING};
use crate::config::WebSocketConfig;
use crate::error::{AppError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No channel and none wanted
    Idle,
    /// Channel establishment in flight
    Connecting,
    /// Live channel, heartbeat running
    Open,
    /// Intentional close in progress, must never trigger reconnection
    Closing,
    /// Waiting out the backoff delay before the next attempt
    Reconnecting,
    /// Retries exhausted; stays parked until an external start
    Failed,
}

/// Events emitted to the owner of the channel
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The server's init frame arrived with its authoritative unread count
    Connected { unread_count: u64 },
    /// A decoded application frame (currently only notifications)
    Frame(ServerFrame),
    /// The channel dropped; `will_retry` says whether backoff is scheduled
    Disconnected { will_retry: bool },
}

enum SessionEnd {
    /// Local teardown requested; a normal close frame was sent
    Shutdown,
    /// Server closed with the normal code; reconnection is suppressed
    Normal,
    /// Anything else: network drop, read error, abnormal close code
    Abnormal,
}

/// Maintains at most one live push channel per authenticated session
pub struct ConnectionManager {
    config: WebSocketConfig,
    state: Arc<RwLock<ConnectionState>>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(config: WebSocketConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Idle)),
            shutdown,
            task: None,
        }
    }

    /// Per-user channel endpoint. The session credential travels in the
    /// path because the handshake cannot carry custom headers from this
    /// client's runtime.
    pub fn endpoint_url(&self, token: &str) -> String {
        format!(
            "{}/ws/notifications/{}",
            self.config.base_url.trim_end_matches('/'),
            token
        )
    }

    /// Open the channel and start the reconnect loop.
    ///
    /// Returns the event receiver for this connection's lifetime. Fails if
    /// a channel is already live; a manager parked in `Failed` (or torn
    /// down) can be started again.
    pub fn start(&mut self, token: &str) -> Result<mpsc::UnboundedReceiver<ConnectionEvent>> {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return Err(AppError::AlreadyStarted);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown = shutdown_tx;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let url = self.endpoint_url(token);
        let config = self.config.clone();
        let state = Arc::clone(&self.state);
        self.task = Some(tokio::spawn(run(config, url, state, events_tx, shutdown_rx)));
        Ok(events_rx)
    }

    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Intentional teardown: close the channel with the normal code, stop
    /// the loop, cancel any pending backoff timer.
    pub async fn shutdown(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "connection task join failed");
            }
        }
        set_state(&self.state, ConnectionState::Idle).await;
    }
}

async fn set_state(state: &Arc<RwLock<ConnectionState>>, next: ConnectionState) {
    let mut guard = state.write().await;
    if *guard != next {
        debug!(from = ?*guard, to = ?next, "connection state");
        *guard = next;
    }
}

async fn run(
    config: WebSocketConfig,
    url: String,
    state: Arc<RwLock<ConnectionState>>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempt: u32 = 0;

    loop {
        set_state(&state, ConnectionState::Connecting).await;

        let connected = tokio::select! {
            res = connect_async(url.as_str()) => Some(res),
            _ = shutdown.changed() => None,
        };

        let session_end = match connected {
            None => SessionEnd::Shutdown,
            Some(Ok((stream, _response))) => {
                attempt = 0;
                set_state(&state, ConnectionState::Open).await;
                info!("push channel open");
                drive_session(stream, &config, &events, &mut shutdown).await
            }
            Some(Err(e)) => {
                warn!(error = %e, "push channel connect failed");
                SessionEnd::Abnormal
            }
        };

        match session_end {
            SessionEnd::Shutdown | SessionEnd::Normal => {
                set_state(&state, ConnectionState::Closing).await;
                let _ = events.send(ConnectionEvent::Disconnected { will_retry: false });
                set_state(&state, ConnectionState::Idle).await;
                return;
            }
            SessionEnd::Abnormal => {}
        }

        attempt += 1;
        if attempt > config.max_reconnect_attempts {
            warn!(attempt, "reconnect attempts exhausted, live notifications disabled");
            let _ = events.send(ConnectionEvent::Disconnected { will_retry: false });
            set_state(&state, ConnectionState::Failed).await;
            return;
        }

        set_state(&state, ConnectionState::Reconnecting).await;
        let _ = events.send(ConnectionEvent::Disconnected { will_retry: true });

        let delay = config.reconnect_delay(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling reconnect");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => {
                set_state(&state, ConnectionState::Closing).await;
                set_state(&state, ConnectionState::Idle).await;
                return;
            }
        }
    }
}

/// Pump one open channel until it ends, keeping the heartbeat going.
///
/// Failure detection rides on the transport's own close/error signaling;
/// the server's heartbeat frame is recognized and discarded without
/// resetting anything.
async fn drive_session(
    mut stream: WsStream,
    config: &WebSocketConfig,
    events: &mpsc::UnboundedSender<ConnectionEvent>,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let period = config.heartbeat_interval();
    let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let close = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client shutdown".into(),
                };
                if let Err(e) = stream.send(Message::Close(Some(close))).await {
                    debug!(error = %e, "close frame send failed");
                }
                return SessionEnd::Shutdown;
            }
            _ = heartbeat.tick() => {
                if let Err(e) = stream.send(Message::text(HEARTBEAT_PING)).await {
                    warn!(error = %e, "heartbeat send failed");
                    return SessionEnd::Abnormal;
                }
                trace!("heartbeat sent");
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => handle_frame(text.as_str(), events),
                Some(Ok(Message::Close(frame))) => {
                    let normal = frame
                        .as_ref()
                        .map(|f| f.code == CloseCode::Normal)
                        .unwrap_or(false);
                    info!(?frame, "push channel closed by server");
                    return if normal { SessionEnd::Normal } else { SessionEnd::Abnormal };
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Ok(other)) => trace!(?other, "ignoring non-text frame"),
                Some(Err(e)) => {
                    warn!(error = %e, "push channel read failed");
                    return SessionEnd::Abnormal;
                }
                None => {
                    warn!("push channel stream ended");
                    return SessionEnd::Abnormal;
                }
            }
        }
    }
}

fn handle_frame(raw: &str, events: &mpsc::UnboundedSender<ConnectionEvent>) {
    match ServerFrame::from_json(raw) {
        Ok(ServerFrame::Init { unread_count }) => {
            let _ = events.send(ConnectionEvent::Connected { unread_count });
        }
        Ok(ServerFrame::Heartbeat) => trace!("server heartbeat"),
        Ok(frame) => {
            let _ = events.send(ConnectionEvent::Frame(frame));
        }
        Err(e) => warn!(error = %e, raw, "discarding malformed frame"),
    }
}
