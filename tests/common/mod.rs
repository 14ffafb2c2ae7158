//! Shared test utilities: a local feed server and a one-shot HTTP responder.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tungstenite::Message;

use tormentus::config::ReconnectPolicy;
use tormentus::feed::FeedEvent;

/// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Binds a feed server on an ephemeral local port.
pub async fn bind_feed() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local addr");
    (listener, format!("ws://{addr}/ws"))
}

/// Accepts the next client and completes the WebSocket handshake.
pub async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("timed out waiting for client")
        .expect("accept failed");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("handshake failed")
}

/// Reads the next text frame sent by the client.
pub async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> String {
    loop {
        let msg = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for client frame")
            .expect("client closed")
            .expect("read failed");
        if let Message::Text(text) = msg {
            return text.to_string();
        }
    }
}

/// Receives the next event from the connection manager.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<FeedEvent>) -> FeedEvent {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for feed event")
        .expect("event channel closed")
}

/// Skips events until `wanted` arrives, returning what was skipped.
pub async fn wait_for(
    rx: &mut mpsc::UnboundedReceiver<FeedEvent>,
    wanted: FeedEvent,
) -> Vec<FeedEvent> {
    let mut skipped = Vec::new();
    loop {
        let event = next_event(rx).await;
        if event == wanted {
            return skipped;
        }
        skipped.push(event);
    }
}

/// A reconnect policy fast enough for tests.
pub fn fast_policy(delay_ms: u64, max_attempts: Option<u32>) -> ReconnectPolicy {
    ReconnectPolicy {
        delay: Duration::from_millis(delay_ms),
        max_attempts,
    }
}

/// Expected subscribe command text for `symbol`.
pub fn subscribe_json(symbol: &str) -> String {
    format!(r#"{{"type":"subscribe","symbol":"{symbol}"}}"#)
}

/// Expected unsubscribe command text for `symbol`.
pub fn unsubscribe_json(symbol: &str) -> String {
    format!(r#"{{"type":"unsubscribe","symbol":"{symbol}"}}"#)
}

/// Serves exactly one HTTP request with the given status and JSON body.
///
/// Returns the base URL and a handle resolving to the raw request text.
pub async fn serve_http_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local addr");
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept failed");
        let request = read_request(&mut stream).await;
        let response = format!(
            "HTTP/1.1 {status} TEST\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream
            .write_all(response.as_bytes())
            .await
            .expect("write failed");
        let _ = stream.shutdown().await;
        request
    });

    (format!("http://{addr}"), handle)
}

/// Reads request headers and a `content-length` body.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.expect("read failed");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
