//! Wire models for the TORMENTUS price feed and REST API.
//!
//! Inbound feed lines are JSON objects tagged by `type` and are surfaced as
//! the [`FeedMessage`] sum type. Outbound feed traffic is limited to
//! [`FeedCommand`] subscribe/unsubscribe requests.

pub mod candle;
pub mod market;
pub mod quote;
pub mod trade;

use serde::Serialize;

use candle::CandleUpdate;
use quote::PriceUpdate;
use trade::TradeResult;

/// Message kinds streamed by the feed (wire tag in the `type` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    PriceUpdate,
    CandleUpdate,
    TradeResult,
    Heartbeat,
}

impl MessageKind {
    /// Returns the wire-format tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::PriceUpdate => "price_update",
            MessageKind::CandleUpdate => "candle_update",
            MessageKind::TradeResult => "trade_result",
            MessageKind::Heartbeat => "heartbeat",
        }
    }

    /// Looks up a kind by its wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "price_update" => Some(MessageKind::PriceUpdate),
            "candle_update" => Some(MessageKind::CandleUpdate),
            "trade_result" => Some(MessageKind::TradeResult),
            "heartbeat" => Some(MessageKind::Heartbeat),
            _ => None,
        }
    }
}

/// A single parsed feed message.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    PriceUpdate(PriceUpdate),
    CandleUpdate(CandleUpdate),
    TradeResult(TradeResult),
    Heartbeat,
}

impl FeedMessage {
    /// Returns the kind of this message.
    pub fn kind(&self) -> MessageKind {
        match self {
            FeedMessage::PriceUpdate(_) => MessageKind::PriceUpdate,
            FeedMessage::CandleUpdate(_) => MessageKind::CandleUpdate,
            FeedMessage::TradeResult(_) => MessageKind::TradeResult,
            FeedMessage::Heartbeat => MessageKind::Heartbeat,
        }
    }
}

/// A `subscribe` or `unsubscribe` command sent to the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedCommand {
    #[serde(rename = "type")]
    pub tpe: String,
    pub symbol: String,
}

impl FeedCommand {
    /// Builds a subscribe command for `symbol`.
    pub fn subscribe(symbol: &str) -> Self {
        Self {
            tpe: "subscribe".to_string(),
            symbol: symbol.to_string(),
        }
    }

    /// Builds an unsubscribe command for `symbol`.
    pub fn unsubscribe(symbol: &str) -> Self {
        Self {
            tpe: "unsubscribe".to_string(),
            symbol: symbol.to_string(),
        }
    }
}
