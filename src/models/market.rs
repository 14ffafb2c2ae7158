//! REST snapshot and account models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A tradable market from `GET /api/markets`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Market {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub change_24h: Decimal,
}

/// Response of `GET /api/protected/verification/check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct VerificationStatus {
    pub can_trade: bool,
    #[serde(default)]
    pub verification_required: bool,
}

impl VerificationStatus {
    /// Returns `true` when the trade form may be submitted.
    pub fn allows_trading(&self) -> bool {
        self.can_trade && !self.verification_required
    }
}

/// The signed-in user stored under the `user` session key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Balance at sign-in; seeds the displayed balance.
    #[serde(default)]
    pub balance: Decimal,
}

impl UserProfile {
    /// Returns the name to show in the header.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}
