//! Tab bar component.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::tui::app::App;
use crate::tui::format::format_change;

/// Renders one tab per subscribed symbol, focused tab highlighted.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let subscriptions = app.store.subscriptions();
    let mut spans: Vec<Span> = Vec::new();

    for (i, symbol) in subscriptions.symbols().iter().enumerate() {
        let is_active = i == subscriptions.focused_index();

        let style = if is_active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let label = if app.store.quotes().has(symbol) {
            let quote = app.store.quotes().read(symbol);
            format!(" {symbol} {} ", format_change(quote.change_24h))
        } else {
            format!(" {symbol} ")
        };

        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }

    let line = Line::from(spans);
    let para = Paragraph::new(line);
    frame.render_widget(para, area);
}
