//! Application state container for the live quote and trade loop.
//!
//! [`Store`] owns the subscription registry, quote cache, chart buffer and
//! trade ledger, and is the only place they are mutated. Every entry point
//! takes the current time explicitly so the whole loop is deterministic
//! under test.

pub mod chart;
pub mod ledger;
pub mod quotes;
pub mod subscriptions;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::Result;
use crate::models::FeedMessage;
use crate::models::FeedCommand;
use crate::models::candle::CandleUpdate;
use crate::models::quote::PriceUpdate;
use crate::models::trade::{Trade, TradeResult};

pub use chart::ChartBuffer;
pub use ledger::{ResolvedTrade, TradeLedger, remaining_secs};
pub use quotes::{Quote, QuoteCache};
pub use subscriptions::{Removal, SubscriptionRegistry};

/// What a feed message changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// A quote was written; `focused` when it also ticked the chart.
    Quote { symbol: String, focused: bool },
    /// The focused chart took a server candle.
    Candle,
    /// An open trade was settled.
    Resolved(ResolvedTrade),
    /// Heartbeat received.
    Heartbeat,
    /// Nothing changed (other symbol's candle, unknown trade id, ...).
    Ignored,
}

/// Single owner of the client's mutable market and trade state.
pub struct Store {
    subscriptions: SubscriptionRegistry,
    quotes: QuoteCache,
    chart: ChartBuffer,
    ledger: TradeLedger,
    last_heartbeat: Option<DateTime<Utc>>,
    rng: StdRng,
}

impl Store {
    /// Creates a store subscribed to `symbols` and focused on the first.
    ///
    /// # Errors
    ///
    /// Returns [`TormentusError::Config`](crate::TormentusError::Config) if
    /// `symbols` is empty.
    pub fn new<S: AsRef<str>>(
        symbols: &[S],
        chart_candles: usize,
        balance: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        Self::with_rng(symbols, chart_candles, balance, now, StdRng::from_os_rng())
    }

    /// Like [`Store::new`] with a fixed RNG seed for the placeholder chart.
    ///
    /// # Errors
    ///
    /// Returns [`TormentusError::Config`](crate::TormentusError::Config) if
    /// `symbols` is empty.
    pub fn with_seed<S: AsRef<str>>(
        symbols: &[S],
        chart_candles: usize,
        balance: Decimal,
        now: DateTime<Utc>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(
            symbols,
            chart_candles,
            balance,
            now,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng<S: AsRef<str>>(
        symbols: &[S],
        chart_candles: usize,
        balance: Decimal,
        now: DateTime<Utc>,
        mut rng: StdRng,
    ) -> Result<Self> {
        let subscriptions = SubscriptionRegistry::new(symbols)?;
        let chart = ChartBuffer::seeded(
            subscriptions.focused(),
            chart_candles,
            Decimal::ZERO,
            now.timestamp(),
            &mut rng,
        );
        Ok(Self {
            subscriptions,
            quotes: QuoteCache::new(),
            chart,
            ledger: TradeLedger::new(balance),
            last_heartbeat: None,
            rng,
        })
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    pub fn quotes(&self) -> &QuoteCache {
        &self.quotes
    }

    pub fn chart(&self) -> &ChartBuffer {
        &self.chart
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        self.last_heartbeat
    }

    /// The focused symbol.
    pub fn focused(&self) -> &str {
        self.subscriptions.focused()
    }

    /// Quote of the focused symbol.
    pub fn focused_quote(&self) -> Quote {
        self.quotes.read(self.subscriptions.focused())
    }

    /// Subscribes to `symbol` (if needed) and focuses it.
    ///
    /// Returns the subscribe command to send when the symbol is new.
    pub fn open_symbol(&mut self, symbol: &str, now: DateTime<Utc>) -> Option<FeedCommand> {
        let added = self.subscriptions.add(symbol);
        self.focus_symbol(symbol, now);
        added.then(|| FeedCommand::subscribe(symbol))
    }

    /// Focuses a tracked symbol and reseeds the chart for it.
    ///
    /// Returns `false` if the symbol is not subscribed.
    pub fn focus_symbol(&mut self, symbol: &str, now: DateTime<Utc>) -> bool {
        if !self.subscriptions.focus(symbol) {
            return false;
        }
        self.reseed_chart(now);
        true
    }

    /// Focuses the next tab.
    pub fn focus_next(&mut self, now: DateTime<Utc>) {
        self.subscriptions.focus_next();
        self.reseed_chart(now);
    }

    /// Focuses the previous tab.
    pub fn focus_previous(&mut self, now: DateTime<Utc>) {
        self.subscriptions.focus_previous();
        self.reseed_chart(now);
    }

    /// Closes the tab for `symbol`.
    ///
    /// Focus moves first; the unsubscribe command is returned only when the
    /// symbol was actually removed.
    pub fn close_symbol(&mut self, symbol: &str, now: DateTime<Utc>) -> Option<FeedCommand> {
        match self.subscriptions.remove(symbol) {
            Removal::Removed { refocused } => {
                if refocused.is_some() {
                    self.reseed_chart(now);
                }
                Some(FeedCommand::unsubscribe(symbol))
            }
            Removal::KeptLast { refocused } => {
                if refocused.is_some() {
                    self.reseed_chart(now);
                }
                None
            }
            Removal::NotTracked => None,
        }
    }

    /// Seeds quotes from the REST snapshot without ticking the chart.
    pub fn seed_quotes(&mut self, prices: &[PriceUpdate], now: DateTime<Utc>) {
        let focused_was_empty = !self.quotes.has(self.subscriptions.focused());
        for update in prices {
            self.quotes
                .write(&update.symbol, update.price, update.change_24h);
        }
        if focused_was_empty && self.quotes.has(self.subscriptions.focused()) {
            self.reseed_chart(now);
        }
    }

    /// Applies one feed message.
    pub fn apply(&mut self, message: FeedMessage, now: DateTime<Utc>) -> Applied {
        match message {
            FeedMessage::PriceUpdate(update) => self.apply_price_update(&update, now),
            FeedMessage::CandleUpdate(update) => self.apply_candle_update(&update),
            FeedMessage::TradeResult(result) => self.apply_trade_result(&result, now),
            FeedMessage::Heartbeat => {
                self.last_heartbeat = Some(now);
                Applied::Heartbeat
            }
        }
    }

    /// Writes the quote and, for the focused symbol, ticks the chart.
    pub fn apply_price_update(&mut self, update: &PriceUpdate, now: DateTime<Utc>) -> Applied {
        self.quotes
            .write(&update.symbol, update.price, update.change_24h);

        let focused = update.symbol == self.subscriptions.focused();
        if focused {
            self.chart
                .apply_tick(update.price, now.timestamp(), &mut self.rng);
        }
        Applied::Quote {
            symbol: update.symbol.clone(),
            focused,
        }
    }

    /// Applies a server candle to the focused chart.
    pub fn apply_candle_update(&mut self, update: &CandleUpdate) -> Applied {
        if update.symbol != self.chart.symbol() {
            return Applied::Ignored;
        }
        if self.chart.apply_candle(update.candle()) {
            Applied::Candle
        } else {
            debug!(symbol = %update.symbol, time = update.time, "Dropped stale candle");
            Applied::Ignored
        }
    }

    /// Settles an open trade.
    pub fn apply_trade_result(&mut self, result: &TradeResult, now: DateTime<Utc>) -> Applied {
        match self.ledger.resolve(result, now) {
            Some(resolved) => {
                info!(
                    id = resolved.trade.id,
                    outcome = ?resolved.outcome,
                    profit = %resolved.profit,
                    "Trade resolved"
                );
                Applied::Resolved(resolved.clone())
            }
            None => Applied::Ignored,
        }
    }

    /// Adds a server-echoed trade to the ledger.
    pub fn record_trade(&mut self, trade: Trade) -> bool {
        self.ledger.record(trade)
    }

    fn reseed_chart(&mut self, now: DateTime<Utc>) {
        let symbol = self.subscriptions.focused().to_string();
        let anchor = self.quotes.read(&symbol).price;
        self.chart
            .reseed(&symbol, anchor, now.timestamp(), &mut self.rng);
    }
}
