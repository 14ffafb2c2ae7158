//! Latest quote per symbol.

use std::collections::HashMap;

use rust_decimal::Decimal;

/// Latest price and 24h change for a symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quote {
    pub price: Decimal,
    pub change_24h: Decimal,
}

/// Latest-write-wins quote store.
///
/// Writes are not ordered: a late message overwrites newer data.
#[derive(Debug, Clone, Default)]
pub struct QuoteCache {
    quotes: HashMap<String, Quote>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the quote for `symbol`.
    pub fn write(&mut self, symbol: &str, price: Decimal, change_24h: Decimal) {
        self.quotes
            .insert(symbol.to_string(), Quote { price, change_24h });
    }

    /// Returns the last written quote, or a zeroed one if never written.
    pub fn read(&self, symbol: &str) -> Quote {
        self.quotes.get(symbol).copied().unwrap_or_default()
    }

    /// Returns `true` if a quote has been written for `symbol`.
    pub fn has(&self, symbol: &str) -> bool {
        self.quotes.contains_key(symbol)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn unknown_symbol_reads_zero() {
        let cache = QuoteCache::new();
        assert_eq!(cache.read("BTC/USDT"), Quote::default());
        assert!(!cache.has("BTC/USDT"));
    }

    #[test]
    fn stale_write_overwrites_newer_value() {
        let mut cache = QuoteCache::new();
        cache.write("BTC/USDT", dec!(67600), dec!(1.3));
        cache.write("BTC/USDT", dec!(67550.25), dec!(1.2));
        assert_eq!(
            cache.read("BTC/USDT"),
            Quote {
                price: dec!(67550.25),
                change_24h: dec!(1.2)
            }
        );
    }
}
