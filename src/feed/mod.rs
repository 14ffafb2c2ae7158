//! Async client for the TORMENTUS price feed (`/ws`).
//!
//! This module is organized by concern:
//! - [`connection`] - Connection lifecycle, fixed-delay reconnect and
//!   subscription replay
//! - [`subscription`] - Subscribe/unsubscribe commands
//! - [`handler`] - Splitting and parsing inbound frames

pub mod connection;
pub mod handler;
pub mod subscription;

use futures_util::StreamExt;
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::info;
use tungstenite::Message;

use crate::Result;

pub use connection::{ConnectionCommand, ConnectionManager, ExitReason, FeedEvent};
pub use handler::{parse_frame, parse_line};
pub use subscription::{resubscribe_all, subscribe, unsubscribe};

/// Write half of a feed connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a feed connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`TormentusError`](crate::TormentusError) if the connection or
/// TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!(url, "WebSocket handshake completed");

    Ok(ws_stream.split())
}
