//! Price update models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payload of a `price_update` feed message, also returned by `GET /api/prices`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PriceUpdate {
    pub symbol: String,
    pub price: Decimal,
    /// 24h change in percent (e.g. `1.2` for +1.2%).
    #[serde(default)]
    pub change_24h: Decimal,
}
