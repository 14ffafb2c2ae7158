//! OHLC candle models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLC bar for a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Candle {
    /// Bucket start in unix seconds.
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// Payload of a `candle_update` feed message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CandleUpdate {
    pub symbol: String,
    pub time: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl CandleUpdate {
    /// Returns the bar carried by this update.
    pub fn candle(&self) -> Candle {
        Candle {
            time: self.time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }
}
