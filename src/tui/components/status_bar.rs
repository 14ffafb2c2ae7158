//! Status bar component.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::tui::app::{App, ConnectionStatus, NoticeKind};
use crate::tui::format::format_amount;

/// Renders the status bar.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let status_color = match app.connection_status {
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Connecting | ConnectionStatus::Reconnecting => Color::Yellow,
        ConnectionStatus::Disconnected | ConnectionStatus::Failed => Color::Red,
    };

    let user_label = match (&app.user, app.authenticated) {
        (Some(user), true) => Span::styled(
            format!(" {} ", user.display_name()),
            Style::default().fg(Color::White),
        ),
        (None, true) => Span::styled(" Signed in ", Style::default().fg(Color::White)),
        (_, false) => Span::styled(" Read-only ", Style::default().fg(Color::DarkGray)),
    };

    let balance_span = if app.authenticated {
        Span::styled(
            format!(" ${} ", format_amount(app.store.ledger().balance())),
            Style::default().fg(Color::Cyan),
        )
    } else {
        Span::raw("")
    };

    let open_trades = app.store.ledger().open_trades().len();
    let trades_info = match app.store.last_heartbeat() {
        Some(at) => format!(
            " {open_trades} open │ beat {}s ago ",
            (app.now - at).num_seconds().max(0)
        ),
        None => format!(" {open_trades} open "),
    };

    let notice_span = match app.notice {
        Some(ref notice) => {
            let color = match notice.kind {
                NoticeKind::Info => Color::Green,
                NoticeKind::Error => Color::Red,
            };
            Span::styled(format!(" {} ", notice.message), Style::default().fg(color))
        }
        None => Span::raw(""),
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", app.connection_status.label()),
            Style::default().fg(status_color),
        ),
        Span::raw("│"),
        user_label,
        Span::raw("│"),
        balance_span,
        Span::raw("│"),
        notice_span,
        Span::raw(format!(
            "{:>width$}",
            trades_info,
            width = area.width.saturating_sub(60) as usize
        )),
    ]);

    let para = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(para, area);
}
