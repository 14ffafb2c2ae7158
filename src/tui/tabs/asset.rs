//! Asset tab layout and rendering.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use rust_decimal::Decimal;

use crate::models::trade::{Direction, TradeOutcome};
use crate::state::{ChartBuffer, remaining_secs};
use crate::tui::app::{App, ChartType, Mode, Modal};
use crate::tui::components::{status_bar, tab_bar};
use crate::tui::format::{
    change_color, format_amount, format_change, format_countdown, format_price,
};

/// Width of the price axis drawn left of the chart.
const AXIS_WIDTH: u16 = 12;

/// Renders the focused asset tab.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Price header
            Constraint::Min(10),   // Chart | markets
            Constraint::Length(8), // Open trades | trade form
            Constraint::Length(1), // Keybindings help
        ])
        .split(area);

    tab_bar::render(frame, main_layout[0], app);
    status_bar::render(frame, main_layout[1], app);
    render_price_header(frame, main_layout[2], app);

    let main_content = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(main_layout[3]);

    render_chart(frame, main_content[0], app);
    render_markets(frame, main_content[1], app);

    let bottom_content = Layout::default()
        .direction(LayoutDirection::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(main_layout[4]);

    render_trades(frame, bottom_content[0], app);
    render_trade_form(frame, bottom_content[1], app);

    render_keybindings(frame, main_layout[5], app);

    if let Some(ref modal) = app.modal {
        render_modal(frame, area, modal);
    }
}

/// Renders the price header for the focused symbol.
fn render_price_header(frame: &mut Frame, area: Rect, app: &App) {
    let symbol = app.store.focused();
    let name = app.market_name(symbol);

    let mut spans = vec![Span::styled(
        format!(" {symbol} "),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if name != symbol {
        spans.push(Span::styled(
            format!("{name} "),
            Style::default().fg(Color::Gray),
        ));
    }

    if app.store.quotes().has(symbol) {
        let quote = app.store.focused_quote();
        let color = change_color(quote.change_24h);
        let arrow = if quote.change_24h >= Decimal::ZERO {
            "▲"
        } else {
            "▼"
        };
        spans.extend([
            Span::styled(arrow, Style::default().fg(color)),
            Span::styled(
                format!(" {} ", format_price(quote.price)),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format_change(quote.change_24h), Style::default().fg(color)),
        ]);
    } else {
        spans.push(Span::styled(" -- ", Style::default().fg(Color::DarkGray)));
    }

    let para = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}

/// Renders the chart panel.
fn render_chart(frame: &mut Frame, area: Rect, app: &App) {
    let title = format!(" Chart [{}] ", app.chart_type.label());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = chart_lines(
        app.store.chart(),
        app.chart_type,
        inner.width,
        inner.height,
    );
    if lines.is_empty() {
        let para = Paragraph::new("No chart data").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(para, inner);
    } else {
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Builds ASCII chart rows: a price axis followed by one column per candle,
/// newest on the right.
pub fn chart_lines(
    chart: &ChartBuffer,
    chart_type: ChartType,
    width: u16,
    height: u16,
) -> Vec<Line<'static>> {
    let Some((min_price, max_price)) = chart.price_range() else {
        return Vec::new();
    };
    let price_range = max_price - min_price;
    let height = height as usize;
    let columns = width.saturating_sub(AXIS_WIDTH) as usize;
    if price_range <= Decimal::ZERO || height == 0 || columns == 0 {
        return Vec::new();
    }

    let skip = chart.len().saturating_sub(columns);
    let visible: Vec<_> = chart.candles().iter().skip(skip).collect();
    let step = price_range / Decimal::from(height);

    let mut lines = Vec::with_capacity(height);
    for row in 0..height {
        let level_high = max_price - step * Decimal::from(row);
        let level_low = if row + 1 == height {
            min_price
        } else {
            max_price - step * Decimal::from(row + 1)
        };

        let mut spans: Vec<Span> = Vec::with_capacity(visible.len() + 1);
        spans.push(Span::styled(
            format!("{:>10.2} │", level_high),
            Style::default().fg(Color::DarkGray),
        ));

        for candle in &visible {
            let is_bullish = candle.close >= candle.open;
            let color = if is_bullish { Color::Green } else { Color::Red };

            let glyph = match chart_type {
                ChartType::Candle => {
                    let body_top = candle.open.max(candle.close);
                    let body_bottom = candle.open.min(candle.close);
                    let touches_body = body_top >= level_low && body_bottom <= level_high;
                    let touches_wick = candle.high >= level_low && candle.low <= level_high;
                    if touches_body {
                        "█"
                    } else if touches_wick {
                        "│"
                    } else {
                        " "
                    }
                }
                ChartType::Line => {
                    if candle.close >= level_low && candle.close <= level_high {
                        "•"
                    } else {
                        " "
                    }
                }
            };

            spans.push(Span::styled(glyph, Style::default().fg(color)));
        }

        lines.push(Line::from(spans));
    }
    lines
}

/// Renders the market list with quotes.
fn render_markets(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Markets ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    let focused = app.store.focused();

    for market in app.markets.iter().take(inner.height as usize) {
        let quote = app.store.quotes().read(&market.symbol);
        let (price, change) = if app.store.quotes().has(&market.symbol) {
            (quote.price, quote.change_24h)
        } else {
            (market.price, market.change_24h)
        };

        let marker = if market.symbol == focused {
            "▶"
        } else if app.store.subscriptions().contains(&market.symbol) {
            "•"
        } else {
            " "
        };

        lines.push(Line::from(vec![
            Span::raw(format!("{marker}{:<10}", market.symbol)),
            Span::raw(format!("{:>12} ", format_price(price))),
            Span::styled(format_change(change), Style::default().fg(change_color(change))),
        ]));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Loading markets...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Renders open trades with countdowns, then recent results.
fn render_trades(frame: &mut Frame, area: Rect, app: &App) {
    let ledger = app.store.ledger();
    let title = format!(" Trades [{} open] ", ledger.open_trades().len());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        format!(
            "{:<6} {:<10} {:<5} {:>10} {:>12} {:>8}",
            "ID", "Symbol", "Dir", "Amount", "Entry", "Left"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )));

    for trade in ledger.open_trades() {
        let remaining = remaining_secs(trade, app.now);
        let left = if remaining > 0 {
            Span::styled(
                format!("{:>8}", format_countdown(remaining)),
                Style::default().fg(Color::Yellow),
            )
        } else {
            Span::styled(
                format!("{:>8}", "awaiting"),
                Style::default().fg(Color::DarkGray),
            )
        };

        lines.push(Line::from(vec![
            Span::raw(format!("{:<6} {:<10} ", trade.id, trade.symbol)),
            direction_span(trade.direction),
            Span::raw(format!(
                " {:>10} {:>12} ",
                format_amount(trade.amount),
                format_price(trade.entry_price)
            )),
            left,
        ]));
    }

    for resolved in ledger.resolved().iter().rev() {
        let (label, color) = match resolved.outcome {
            TradeOutcome::Won => ("WON", Color::Green),
            TradeOutcome::Lost => ("LOST", Color::Red),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<6} {:<10} ", resolved.trade.id, resolved.trade.symbol),
                Style::default().fg(Color::DarkGray),
            ),
            direction_span(resolved.trade.direction),
            Span::styled(
                format!(" {:>10} {:>12} ", format_amount(resolved.trade.amount), label),
                Style::default().fg(color),
            ),
            Span::styled(
                format!("{:>+8.2}", resolved.profit.round_dp(2)),
                Style::default().fg(color),
            ),
        ]));
    }

    if lines.len() == 1 {
        lines.push(Line::from(Span::styled(
            "No trades",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn direction_span(direction: Direction) -> Span<'static> {
    match direction {
        Direction::Up => Span::styled("UP   ", Style::default().fg(Color::Green)),
        Direction::Down => Span::styled("DOWN ", Style::default().fg(Color::Red)),
    }
}

/// Renders the amount/duration form.
fn render_trade_form(frame: &mut Frame, area: Rect, app: &App) {
    let border_style = if app.mode == Mode::Insert {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .title(format!(" Trade {} ", app.store.focused()))
        .borders(Borders::ALL)
        .border_style(border_style);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let amount_style = if app.mode == Mode::Insert {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    };

    let status = if !app.authenticated {
        Span::styled("Sign in to trade", Style::default().fg(Color::DarkGray))
    } else if app.trade_pending {
        Span::styled("Submitting...", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("[u] Up   [d] Down", Style::default().fg(Color::White))
    };

    const AMOUNT_LABEL: &str = "Amount:   $";
    if app.mode == Mode::Insert {
        let x = inner.x + AMOUNT_LABEL.len() as u16 + app.amount_input.cursor() as u16;
        frame.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y));
    }

    let lines = vec![
        Line::from(vec![
            Span::raw(AMOUNT_LABEL),
            Span::styled(format!("{:<10}", app.amount_input.as_str()), amount_style),
        ]),
        Line::from(vec![
            Span::raw("Duration: "),
            Span::styled(
                format!("◀ {}s ▶", app.duration()),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(""),
        Line::from(status),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Renders the keybindings help line.
fn render_keybindings(frame: &mut Frame, area: Rect, app: &App) {
    let help = match app.mode {
        Mode::Insert => "[0-9.] amount [Enter/Esc] done",
        Mode::Normal => {
            "[Tab]switch [a]dd market [x]close [g]chart [i]amount [ / ]duration [u]p [d]own [L]ogout [q]uit"
        }
    };

    let para = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(para, area);
}

/// Renders a blocking dialog centered over the screen.
fn render_modal(frame: &mut Frame, area: Rect, modal: &Modal) {
    let popup = centered_rect(area, 50, 7);
    frame.render_widget(Clear, popup);

    let border_color = match modal {
        Modal::Alert(_) => Color::Red,
        Modal::VerificationRequired => Color::Yellow,
    };
    let block = Block::default()
        .title(modal.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let lines = vec![
        Line::from(modal.body().to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] OK",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let para = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(para, popup);
}

/// A rectangle `percent_x` wide and `height` tall, centered in `area`.
fn centered_rect(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;

    #[test]
    fn chart_rows_match_height_and_width() {
        let mut rng = StdRng::seed_from_u64(5);
        let chart = ChartBuffer::seeded("BTC/USDT", 100, dec!(67550.25), 1_700_000_000, &mut rng);

        let lines = chart_lines(&chart, ChartType::Candle, AXIS_WIDTH + 40, 10);
        assert_eq!(lines.len(), 10);
        // Axis span plus one span per visible candle.
        assert!(lines.iter().all(|l| l.spans.len() == 41));
    }

    #[test]
    fn every_candle_column_is_drawn_somewhere() {
        let mut rng = StdRng::seed_from_u64(9);
        let chart = ChartBuffer::seeded("ETH/USDT", 30, dec!(3000), 1_700_000_000, &mut rng);

        for chart_type in [ChartType::Candle, ChartType::Line] {
            let lines = chart_lines(&chart, chart_type, AXIS_WIDTH + 30, 12);
            for column in 1..=30 {
                assert!(
                    lines.iter().any(|l| l.spans[column].content != " "),
                    "{chart_type:?} column {column} is empty"
                );
            }
        }
    }

    #[test]
    fn too_narrow_area_draws_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let chart = ChartBuffer::seeded("BTC/USDT", 10, dec!(100), 1_700_000_000, &mut rng);
        assert!(chart_lines(&chart, ChartType::Candle, AXIS_WIDTH, 10).is_empty());
    }

    #[test]
    fn centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect(area, 50, 7);
        assert_eq!(popup, Rect::new(25, 16, 50, 7));
    }
}
