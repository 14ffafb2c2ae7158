//! Display formatting for prices, changes and countdowns.

use ratatui::style::Color;
use rust_decimal::Decimal;

/// Formats a price as `$67550.25`.
///
/// At least two decimals are shown (six below one dollar). Prices quoted
/// with more places keep all of them, so the readout matches the feed.
pub fn format_price(price: Decimal) -> String {
    let min_dp = if price.abs() >= Decimal::ONE || price.is_zero() {
        2
    } else {
        6
    };
    let dp = price.normalize().scale().max(min_dp) as usize;
    format!("${price:.dp$}")
}

/// Formats a 24h change percentage as `+1.20%` / `-0.68%`.
pub fn format_change(change: Decimal) -> String {
    format!("{:+.2}%", change.round_dp(2))
}

/// Formats an amount of money rounded to cents, without a currency sign.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Green for non-negative changes, red otherwise.
pub fn change_color(change: Decimal) -> Color {
    if change >= Decimal::ZERO {
        Color::Green
    } else {
        Color::Red
    }
}

/// Formats remaining seconds as `M:SS`.
pub fn format_countdown(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{}:{:02}", secs / 60, secs % 60)
}
