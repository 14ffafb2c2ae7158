//! Client-side trade ledger and displayed balance.
//!
//! Trades enter the ledger from the server's submit echo and leave it on a
//! matching `trade_result`. The balance is display-only: it starts from
//! the session profile and moves by each result's signed profit, with no
//! reconciliation against the server.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::trade::{Trade, TradeOutcome, TradeResult, TradeStatus};

/// Number of resolved trades kept for display.
pub const MAX_RESOLVED_HISTORY: usize = 50;

/// A trade that reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrade {
    pub trade: Trade,
    pub outcome: TradeOutcome,
    pub profit: Decimal,
    pub resolved_at: DateTime<Utc>,
}

/// Open trades, recent results and the displayed balance.
#[derive(Debug, Clone, Default)]
pub struct TradeLedger {
    open: Vec<Trade>,
    resolved: VecDeque<ResolvedTrade>,
    balance: Decimal,
}

impl TradeLedger {
    /// Creates an empty ledger displaying `balance`.
    pub fn new(balance: Decimal) -> Self {
        Self {
            open: Vec::new(),
            resolved: VecDeque::with_capacity(MAX_RESOLVED_HISTORY),
            balance,
        }
    }

    /// Adds a server-echoed trade. Returns `false` (and keeps the ledger
    /// unchanged) if the echo is not open or its id is already tracked.
    pub fn record(&mut self, trade: Trade) -> bool {
        if trade.status != TradeStatus::Open {
            warn!(id = trade.id, status = ?trade.status, "Ignoring non-open trade echo");
            return false;
        }
        if self.open.iter().any(|t| t.id == trade.id) {
            warn!(id = trade.id, "Ignoring duplicate trade echo");
            return false;
        }
        debug!(id = trade.id, symbol = %trade.symbol, "Trade opened");
        self.open.push(trade);
        true
    }

    /// Resolves the open trade matching `result.id`.
    ///
    /// The trade leaves the open list exactly once and the balance moves by
    /// `result.profit`. Results for unknown or already-resolved ids are
    /// ignored.
    pub fn resolve(&mut self, result: &TradeResult, now: DateTime<Utc>) -> Option<&ResolvedTrade> {
        let Some(index) = self.open.iter().position(|t| t.id == result.id) else {
            debug!(id = result.id, "Result for unknown trade");
            return None;
        };

        let mut trade = self.open.remove(index);
        trade.status = result.status.into();
        self.balance += result.profit;

        if self.resolved.len() >= MAX_RESOLVED_HISTORY {
            self.resolved.pop_front();
        }
        self.resolved.push_back(ResolvedTrade {
            trade,
            outcome: result.status,
            profit: result.profit,
            resolved_at: now,
        });
        self.resolved.back()
    }

    pub fn open_trades(&self) -> &[Trade] {
        &self.open
    }

    /// Resolved trades, oldest first.
    pub fn resolved(&self) -> &VecDeque<ResolvedTrade> {
        &self.resolved
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }
}

/// Whole seconds left until `trade` expires, clamped at zero.
///
/// Derived from the wall clock on every call, so client/server clock drift
/// shows up directly in the countdown.
pub fn remaining_secs(trade: &Trade, now: DateTime<Utc>) -> i64 {
    (trade.expires_at - now).num_seconds().max(0)
}
