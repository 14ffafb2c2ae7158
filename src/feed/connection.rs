//! Feed connection lifecycle management.
//!
//! [`ConnectionManager`] connects, replays the tracked subscription set,
//! reads frames, and on any disconnect waits a fixed delay before trying
//! again. It keeps running until cancelled, until the receiving side of
//! its event channel is dropped, or until the [`ReconnectPolicy`] runs out
//! of attempts.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tungstenite::Message as WsMessage;

use super::{WsReader, WsWriter, connect, parse_frame, resubscribe_all, subscribe, unsubscribe};
use crate::config::ReconnectPolicy;
use crate::models::FeedMessage;

/// Commands sent from the UI to the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCommand {
    /// A symbol tab was opened.
    Subscribe(String),
    /// A symbol tab was closed.
    Unsubscribe(String),
}

/// Notifications emitted by the connection manager.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A connection attempt is starting.
    Connecting,
    /// Connected and the subscription set has been replayed.
    Connected,
    /// The connection was lost or could not be opened.
    Disconnected,
    /// The reconnect policy ran out of attempts; no more retries.
    GaveUp,
    /// A parsed feed message.
    Message(FeedMessage),
}

/// Why [`ConnectionManager::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The cancellation token fired.
    Cancelled,
    /// The event receiver or the command sender was dropped.
    ChannelClosed,
    /// `max_attempts` consecutive connection attempts failed.
    GaveUp,
}

/// Why the reader loop exited.
enum DisconnectReason {
    /// The connection was lost or errored.
    ConnectionLost,
    /// The manager should stop.
    Exit(ExitReason),
}

/// Manages the feed connection, reconnecting after a fixed delay and
/// re-subscribing every tracked symbol on each open.
///
/// Events are delivered as `T`, so the UI can receive them on its own
/// message channel.
pub struct ConnectionManager<T> {
    url: String,
    policy: ReconnectPolicy,
    tx: mpsc::UnboundedSender<T>,
    cmd_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
    cancel: CancellationToken,
    subscribed: Vec<String>,
}

impl<T> ConnectionManager<T>
where
    T: From<FeedEvent> + Send + 'static,
{
    /// Creates a new connection manager tracking `symbols`.
    #[must_use]
    pub fn new(
        url: String,
        policy: ReconnectPolicy,
        symbols: Vec<String>,
        tx: mpsc::UnboundedSender<T>,
        cmd_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            url,
            policy,
            tx,
            cmd_rx,
            cancel,
            subscribed: symbols,
        }
    }

    /// Forwards an event; `false` once the receiver is gone.
    fn emit(&self, event: FeedEvent) -> bool {
        self.tx.send(T::from(event)).is_ok()
    }

    /// Applies a command to the tracked set. Returns `true` if it changed.
    fn track(&mut self, command: &ConnectionCommand) -> bool {
        match command {
            ConnectionCommand::Subscribe(symbol) => {
                if self.subscribed.contains(symbol) {
                    return false;
                }
                self.subscribed.push(symbol.clone());
                true
            }
            ConnectionCommand::Unsubscribe(symbol) => {
                let before = self.subscribed.len();
                self.subscribed.retain(|s| s != symbol);
                self.subscribed.len() != before
            }
        }
    }

    /// Runs the connection loop until cancellation, channel closure, or
    /// policy exhaustion.
    pub async fn run(mut self) -> ExitReason {
        let mut failures: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return ExitReason::Cancelled;
            }
            if !self.emit(FeedEvent::Connecting) {
                return ExitReason::ChannelClosed;
            }

            info!(url = %self.url, attempt = failures + 1, "Connecting to price feed");
            let connected = tokio::select! {
                () = self.cancel.cancelled() => return ExitReason::Cancelled,
                result = connect(&self.url) => result,
            };

            match connected {
                Ok((mut write, read)) => {
                    failures = 0;
                    match resubscribe_all(&mut write, &self.subscribed).await {
                        Ok(()) => {
                            if !self.emit(FeedEvent::Connected) {
                                return ExitReason::ChannelClosed;
                            }
                            info!(symbols = ?self.subscribed, "Price feed connected and subscribed");

                            match self.read_loop(write, read).await {
                                DisconnectReason::ConnectionLost => {}
                                DisconnectReason::Exit(reason) => {
                                    info!(?reason, "Connection manager shutting down");
                                    return reason;
                                }
                            }
                        }
                        Err(e) => warn!("Failed to replay subscriptions: {e}"),
                    }
                }
                Err(e) => {
                    error!("Connection failed: {e}");
                    failures += 1;
                }
            }

            if !self.emit(FeedEvent::Disconnected) {
                return ExitReason::ChannelClosed;
            }
            if self.policy.exhausted(failures) {
                warn!(failures, "Reconnect attempts exhausted");
                self.emit(FeedEvent::GaveUp);
                return ExitReason::GaveUp;
            }

            info!(
                delay_ms = self.policy.delay.as_millis() as u64,
                "Waiting before reconnect"
            );
            if let Some(reason) = self.wait_before_retry().await {
                return reason;
            }
        }
    }

    /// Sleeps for the reconnect delay while still tracking commands.
    async fn wait_before_retry(&mut self) -> Option<ExitReason> {
        let sleep = tokio::time::sleep(self.policy.delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return Some(ExitReason::Cancelled),
                () = &mut sleep => return None,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(command) => {
                        self.track(&command);
                    }
                    None => return Some(ExitReason::ChannelClosed),
                },
            }
        }
    }

    /// Reads frames until disconnection, cancellation or shutdown.
    async fn read_loop(&mut self, mut write: WsWriter, mut read: WsReader) -> DisconnectReason {
        let reason = loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    break DisconnectReason::Exit(ExitReason::Cancelled);
                }

                msg = read.next() => {
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => {
                            for message in parse_frame(&text) {
                                if !self.emit(FeedEvent::Message(message)) {
                                    break;
                                }
                            }
                            if self.tx.is_closed() {
                                break DisconnectReason::Exit(ExitReason::ChannelClosed);
                            }
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            debug!(?frame, "Received close frame");
                        }
                        Some(Ok(_)) => {} // Binary/Ping/Pong frames
                        Some(Err(e)) => {
                            warn!("WebSocket error: {e}");
                            break DisconnectReason::ConnectionLost;
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            break DisconnectReason::ConnectionLost;
                        }
                    }
                }

                cmd = self.cmd_rx.recv() => {
                    let Some(command) = cmd else {
                        break DisconnectReason::Exit(ExitReason::ChannelClosed);
                    };
                    if !self.track(&command) {
                        continue;
                    }
                    let sent = match &command {
                        ConnectionCommand::Subscribe(symbol) => subscribe(&mut write, symbol).await,
                        ConnectionCommand::Unsubscribe(symbol) => unsubscribe(&mut write, symbol).await,
                    };
                    if let Err(e) = sent {
                        warn!("Failed to send {command:?}: {e}");
                        break DisconnectReason::ConnectionLost;
                    }
                }
            }
        };

        if matches!(reason, DisconnectReason::Exit(_)) {
            let _ = write.close().await;
        }
        reason
    }
}
