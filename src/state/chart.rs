//! Rolling candle buffer for the focused symbol.
//!
//! The buffer is a placeholder series: it is seeded client-side with a
//! random walk ending at the current quote whenever focus changes, then
//! extended by quote ticks and server candles. Both land in the same
//! fixed-width time buckets. Length stays fixed.

use std::collections::VecDeque;

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::models::candle::Candle;

/// Maximum relative high/low spread of a synthetic tick candle (0.01%).
pub const TICK_JITTER: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Width of one candle bucket in seconds.
pub const CANDLE_INTERVAL_SECS: i64 = 60;

/// Anchor used when the symbol has no quote yet.
const FALLBACK_ANCHOR: Decimal = Decimal::ONE_HUNDRED;

/// Maximum per-candle move of the seeded random walk (0.2%).
const SEED_STEP: f64 = 0.002;

/// Maximum wick length of a seeded candle relative to its body (0.1%).
const SEED_WICK: f64 = 0.001;

/// Decimal places kept on synthetic prices.
const PRICE_DP: u32 = 8;

/// Fixed-length candle buffer bound to one symbol.
#[derive(Debug, Clone)]
pub struct ChartBuffer {
    symbol: String,
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl ChartBuffer {
    /// Creates a buffer for `symbol` filled with `capacity` seeded candles
    /// ending just before `now` (unix seconds) at `anchor`.
    pub fn seeded<R: Rng + ?Sized>(
        symbol: &str,
        capacity: usize,
        anchor: Decimal,
        now: i64,
        rng: &mut R,
    ) -> Self {
        let mut buffer = Self {
            symbol: String::new(),
            candles: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        };
        buffer.reseed(symbol, anchor, now, rng);
        buffer
    }

    /// Discards the series and regenerates it for `symbol`.
    pub fn reseed<R: Rng + ?Sized>(&mut self, symbol: &str, anchor: Decimal, now: i64, rng: &mut R) {
        let anchor = if anchor > Decimal::ZERO {
            anchor
        } else {
            FALLBACK_ANCHOR
        };

        // Walk backwards from the anchor so the newest close equals it.
        let mut closes = Vec::with_capacity(self.capacity + 1);
        let mut price = anchor;
        closes.push(price);
        for _ in 0..self.capacity {
            price = (price * random_factor(rng, SEED_STEP)).round_dp(PRICE_DP);
            closes.push(price);
        }
        closes.reverse();

        self.symbol = symbol.to_string();
        self.candles.clear();
        // The newest seeded bar is the bucket before the one holding `now`.
        let first_time = bucket_start(now) - CANDLE_INTERVAL_SECS * self.capacity as i64;
        for (i, pair) in closes.windows(2).enumerate() {
            let (open, close) = (pair[0], pair[1]);
            let high = (open.max(close) * (Decimal::ONE + random_unit(rng) * wick()))
                .round_dp(PRICE_DP);
            let low = (open.min(close) * (Decimal::ONE - random_unit(rng) * wick()))
                .round_dp(PRICE_DP);
            self.candles.push_back(Candle {
                time: first_time + CANDLE_INTERVAL_SECS * i as i64,
                open,
                high,
                low,
                close,
            });
        }
    }

    /// Folds a quote tick into the series.
    ///
    /// A tick inside the last candle's bucket updates it in place;
    /// otherwise a new candle (open = close = `price`, jittered high/low) is
    /// appended at the tick's bucket and the oldest dropped.
    pub fn apply_tick<R: Rng + ?Sized>(&mut self, price: Decimal, now: i64, rng: &mut R) {
        let jitter = random_unit(rng) * TICK_JITTER;
        let high = (price * (Decimal::ONE + jitter)).round_dp(PRICE_DP);
        let low = (price * (Decimal::ONE - jitter)).round_dp(PRICE_DP);
        let time = bucket_start(now);

        // A server bar may already sit ahead of the local clock.
        if let Some(last) = self.candles.back_mut()
            && last.time >= time
        {
            last.close = price;
            last.high = last.high.max(high);
            last.low = last.low.min(low);
            return;
        }

        self.push(Candle {
            time,
            open: price,
            high,
            low,
            close: price,
        });
    }

    /// Applies a server candle: replaces the last bar when the bucket
    /// matches, appends when newer. Older bars are ignored; returns
    /// whether the buffer changed.
    pub fn apply_candle(&mut self, candle: Candle) -> bool {
        match self.candles.back_mut() {
            Some(last) if last.time == candle.time => {
                *last = candle;
                true
            }
            Some(last) if last.time > candle.time => false,
            _ => {
                self.push(candle);
                true
            }
        }
    }

    fn push(&mut self, candle: Candle) {
        if self.candles.len() >= self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &VecDeque<Candle> {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// Lowest low and highest high across the buffer.
    pub fn price_range(&self) -> Option<(Decimal, Decimal)> {
        let first = self.candles.front()?;
        Some(
            self.candles
                .iter()
                .fold((first.low, first.high), |(low, high), c| {
                    (low.min(c.low), high.max(c.high))
                }),
        )
    }
}

/// Start of the bucket holding `ts` (unix seconds).
pub fn bucket_start(ts: i64) -> i64 {
    ts - ts.rem_euclid(CANDLE_INTERVAL_SECS)
}

fn wick() -> Decimal {
    Decimal::from_f64(SEED_WICK).unwrap_or_default()
}

/// Uniform sample in `[0, 1]`.
fn random_unit<R: Rng + ?Sized>(rng: &mut R) -> Decimal {
    Decimal::from_f64(rng.random_range(0.0..=1.0))
        .unwrap_or_default()
        .round_dp(PRICE_DP)
}

/// Uniform multiplicative step in `[1 - max, 1 + max]`.
fn random_factor<R: Rng + ?Sized>(rng: &mut R, max: f64) -> Decimal {
    Decimal::from_f64(1.0 + rng.random_range(-max..=max))
        .unwrap_or(Decimal::ONE)
        .round_dp(PRICE_DP)
}
