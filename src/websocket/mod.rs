/// WebSocket push channel
///
/// This module owns the client side of the real-time channel.
///
/// Architecture:
/// 1. ConnectionManager: lifecycle, heartbeat, bounded reconnect backoff
/// 2. ServerFrame: typed wire messages decoded at the channel boundary
/// 3. ConnectionEvent: typed events emitted to the owning session

pub mod connection;
pub mod messages;

pub use connection::{ConnectionEvent, ConnectionManager, ConnectionState};
pub use messages::{ServerFrame, HEARTBEAT_PING};
