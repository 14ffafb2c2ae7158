//! Symbol subscribe and unsubscribe commands.

use futures_util::SinkExt;
use tracing::{debug, info};
use tungstenite::Message;

use super::WsWriter;
use crate::Result;
use crate::models::FeedCommand;

/// Sends a single feed command.
async fn send_command(write: &mut WsWriter, command: &FeedCommand) -> Result<()> {
    let json = serde_json::to_string(command)?;
    debug!("Sending feed command: {}", json);
    write.send(Message::Text(json.into())).await?;

    Ok(())
}

/// Asks the feed to stream quotes for `symbol`.
///
/// # Errors
///
/// Returns a [`TormentusError`](crate::TormentusError) if sending the
/// command fails.
pub async fn subscribe(write: &mut WsWriter, symbol: &str) -> Result<()> {
    send_command(write, &FeedCommand::subscribe(symbol)).await?;
    info!(symbol, "Subscribed to symbol");

    Ok(())
}

/// Stops streaming quotes for `symbol`.
///
/// # Errors
///
/// Returns a [`TormentusError`](crate::TormentusError) if sending the
/// command fails.
pub async fn unsubscribe(write: &mut WsWriter, symbol: &str) -> Result<()> {
    send_command(write, &FeedCommand::unsubscribe(symbol)).await?;
    info!(symbol, "Unsubscribed from symbol");

    Ok(())
}

/// Replays the whole subscription set on a fresh connection, in order.
///
/// # Errors
///
/// Returns the first send failure; later symbols are not attempted.
pub async fn resubscribe_all(write: &mut WsWriter, symbols: &[String]) -> Result<()> {
    for symbol in symbols {
        subscribe(write, symbol).await?;
    }

    Ok(())
}
