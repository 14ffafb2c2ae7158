//! Inbound frame parsing.
//!
//! The feed may batch several JSON documents into one text frame, one per
//! line. Each line is parsed on its own; a bad line is logged and skipped
//! without affecting the rest of the batch.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{FeedMessage, MessageKind};
use crate::{Result, TormentusError};

/// Parses every line of a text frame, skipping blank and malformed lines.
pub fn parse_frame(text: &str) -> Vec<FeedMessage> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parse_line(line) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(error = %e, line, "Skipping malformed feed message");
                None
            }
        })
        .collect()
}

/// Parses one JSON document into a [`FeedMessage`].
///
/// The payload is read from `data`; documents without a `data` object are
/// read from their top-level fields.
///
/// # Errors
///
/// Returns [`TormentusError::Json`] for invalid JSON or payloads, and
/// [`TormentusError::MalformedMessage`] for a missing or unknown `type`.
pub fn parse_line(line: &str) -> Result<FeedMessage> {
    let mut value: Value = serde_json::from_str(line)?;

    let tag = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| TormentusError::MalformedMessage("missing type tag".to_string()))?;
    let kind = MessageKind::from_tag(tag)
        .ok_or_else(|| TormentusError::MalformedMessage(format!("unknown type {tag:?}")))?;

    let message = match kind {
        MessageKind::PriceUpdate => FeedMessage::PriceUpdate(payload(&mut value)?),
        MessageKind::CandleUpdate => FeedMessage::CandleUpdate(payload(&mut value)?),
        MessageKind::TradeResult => FeedMessage::TradeResult(payload(&mut value)?),
        MessageKind::Heartbeat => FeedMessage::Heartbeat,
    };
    debug!(kind = kind.as_str(), "Parsed feed message");

    Ok(message)
}

/// Deserializes the message payload out of `value`.
fn payload<T: DeserializeOwned>(value: &mut Value) -> Result<T> {
    let data = if value.get("data").is_some_and(Value::is_object) {
        value["data"].take()
    } else {
        value.take()
    };
    Ok(serde_json::from_value(data)?)
}
