//! Binary-option trade models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Predicted price direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Returns the wire/display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// Lifecycle state of a trade: `open -> won | lost`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    #[default]
    Open,
    Won,
    Lost,
}

/// Terminal outcome reported by a `trade_result` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeOutcome {
    Won,
    Lost,
}

impl From<TradeOutcome> for TradeStatus {
    fn from(outcome: TradeOutcome) -> Self {
        match outcome {
            TradeOutcome::Won => TradeStatus::Won,
            TradeOutcome::Lost => TradeStatus::Lost,
        }
    }
}

/// A trade as echoed by the server after submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Trade {
    pub id: u64,
    pub symbol: String,
    pub direction: Direction,
    pub amount: Decimal,
    pub entry_price: Decimal,
    /// Authoritative expiry (unix seconds on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub status: TradeStatus,
}

/// Body of `POST /api/protected/trades`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub direction: Direction,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Contract duration in seconds.
    pub duration: u32,
}

/// Successful response of `POST /api/protected/trades`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceTradeResponse {
    pub trade: Trade,
}

/// Payload of a `trade_result` feed message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradeResult {
    pub id: u64,
    pub status: TradeOutcome,
    /// Signed profit (negative for a loss) applied to the displayed balance.
    pub profit: Decimal,
}
