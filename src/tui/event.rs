//! Event handling for the TUI.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::api::{SIGN_IN_REQUIRED, validate_trade_form};
use crate::feed::FeedEvent;
use crate::models::market::{Market, VerificationStatus};
use crate::models::quote::PriceUpdate;
use crate::models::trade::{Direction, Trade, TradeOutcome, TradeRequest};
use crate::state::Applied;

use super::app::{App, ConnectionStatus, Mode, Modal};

/// Events that can occur in the application.
#[derive(Debug)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// Terminal was resized.
    Resize(u16, u16),
    /// Periodic tick for UI updates.
    Tick,
}

/// Messages that update application state.
///
/// Failures from background tasks arrive as display strings.
#[derive(Debug)]
pub enum Message {
    /// Input event from terminal.
    Input(Event),
    /// Connection lifecycle or a parsed feed message.
    Feed(FeedEvent),
    /// `GET /api/markets` finished.
    MarketsLoaded(Result<Vec<Market>, String>),
    /// `GET /api/prices` finished.
    PricesLoaded(Result<Vec<PriceUpdate>, String>),
    /// Verification gate answered for a pending trade.
    VerificationChecked {
        request: TradeRequest,
        result: Result<VerificationStatus, String>,
    },
    /// Trade submission finished.
    TradePlaced(Result<Trade, String>),
    /// Request to quit the application.
    Quit,
}

impl From<FeedEvent> for Message {
    fn from(event: FeedEvent) -> Self {
        Message::Feed(event)
    }
}

/// Actions that require external handling (feed commands, REST calls).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Subscribe the feed to a newly opened tab.
    Subscribe(String),
    /// Unsubscribe the feed from a closed tab.
    Unsubscribe(String),
    /// Run the verification gate before submitting.
    CheckVerification(TradeRequest),
    /// Submit a trade that passed the gate.
    PlaceTrade(TradeRequest),
    /// Clear the stored session.
    Logout,
}

/// Spawns a task that polls for terminal events and sends them to a channel.
pub fn spawn_event_reader(tx: mpsc::UnboundedSender<Message>) {
    tokio::spawn(async move {
        loop {
            // Poll for events with a 50ms timeout
            match tokio::task::spawn_blocking(|| {
                if event::poll(Duration::from_millis(50)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            })
            .await
            {
                Ok(Some(CrosstermEvent::Key(key))) => {
                    if tx.send(Message::Input(Event::Key(key))).is_err() {
                        break;
                    }
                }
                Ok(Some(CrosstermEvent::Resize(w, h))) => {
                    if tx.send(Message::Input(Event::Resize(w, h))).is_err() {
                        break;
                    }
                }
                Ok(_) => {
                    if tx.is_closed() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
}

/// Spawns a task that sends periodic tick events.
pub fn spawn_tick_timer(tx: mpsc::UnboundedSender<Message>, interval_ms: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            interval.tick().await;
            if tx.send(Message::Input(Event::Tick)).is_err() {
                break;
            }
        }
    });
}

/// Updates application state based on a message.
pub fn update(app: &mut App, message: Message) -> Option<Action> {
    update_at(app, message, Utc::now())
}

/// [`update`] with an explicit clock.
pub fn update_at(app: &mut App, message: Message, now: DateTime<Utc>) -> Option<Action> {
    match message {
        Message::Input(event) => handle_input(app, event, now),
        Message::Feed(event) => {
            handle_feed(app, event, now);
            None
        }
        Message::MarketsLoaded(Ok(markets)) => {
            info!(count = markets.len(), "Markets loaded");
            app.markets = markets;
            None
        }
        Message::PricesLoaded(Ok(prices)) => {
            app.store.seed_quotes(&prices, now);
            None
        }
        Message::MarketsLoaded(Err(error)) | Message::PricesLoaded(Err(error)) => {
            app.show_error(error);
            None
        }
        Message::VerificationChecked { request, result } => match result {
            Ok(status) if status.allows_trading() => Some(Action::PlaceTrade(request)),
            Ok(status) => {
                info!(?status, "Trade blocked by verification gate");
                app.trade_pending = false;
                app.modal = Some(Modal::VerificationRequired);
                None
            }
            Err(error) => {
                app.trade_pending = false;
                app.alert(error);
                None
            }
        },
        Message::TradePlaced(result) => {
            app.trade_pending = false;
            match result {
                Ok(trade) => {
                    let notice = format!(
                        "Trade #{} placed: {} {} ${}",
                        trade.id,
                        trade.direction.as_str().to_uppercase(),
                        trade.symbol,
                        trade.amount
                    );
                    if app.store.record_trade(trade) {
                        app.show_info(notice);
                    }
                }
                Err(error) => app.alert(error),
            }
            None
        }
        Message::Quit => {
            app.should_quit = true;
            None
        }
    }
}

/// Applies connection lifecycle changes and feed messages.
fn handle_feed(app: &mut App, event: FeedEvent, now: DateTime<Utc>) {
    match event {
        FeedEvent::Connecting => {
            app.connection_status = if app.has_connected {
                ConnectionStatus::Reconnecting
            } else {
                ConnectionStatus::Connecting
            };
        }
        FeedEvent::Connected => {
            app.connection_status = ConnectionStatus::Connected;
            app.has_connected = true;
        }
        FeedEvent::Disconnected => {
            app.connection_status = ConnectionStatus::Disconnected;
        }
        FeedEvent::GaveUp => {
            app.connection_status = ConnectionStatus::Failed;
            app.show_error("Price feed unavailable; restart to retry");
        }
        FeedEvent::Message(message) => {
            if let Applied::Resolved(resolved) = app.store.apply(message, now) {
                let text = match resolved.outcome {
                    TradeOutcome::Won => format!(
                        "Trade #{} won {:+}",
                        resolved.trade.id, resolved.profit
                    ),
                    TradeOutcome::Lost => format!(
                        "Trade #{} lost {:+}",
                        resolved.trade.id, resolved.profit
                    ),
                };
                match resolved.outcome {
                    TradeOutcome::Won => app.show_info(text),
                    TradeOutcome::Lost => app.show_error(text),
                }
            }
        }
    }
}

/// Handles input events and updates application state.
fn handle_input(app: &mut App, event: Event, now: DateTime<Utc>) -> Option<Action> {
    match event {
        Event::Key(key) => handle_key(app, key, now),
        Event::Resize(_, _) => None,
        Event::Tick => {
            app.now = now;
            app.clear_stale_notices();
            None
        }
    }
}

/// Handles key press events.
fn handle_key(app: &mut App, key: KeyEvent, now: DateTime<Utc>) -> Option<Action> {
    // An open dialog swallows everything until dismissed
    if app.modal.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.modal = None;
        }
        return None;
    }

    match app.mode {
        Mode::Normal => handle_normal_mode(app, key, now),
        Mode::Insert => handle_insert_mode(app, key),
    }
}

/// Handles keys in normal mode.
fn handle_normal_mode(app: &mut App, key: KeyEvent, now: DateTime<Utc>) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') if key.modifiers.is_empty() => {
            app.should_quit = true;
            None
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            None
        }

        // Tab navigation
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.store.focus_previous(now);
            } else {
                app.store.focus_next(now);
            }
            None
        }
        KeyCode::BackTab => {
            app.store.focus_previous(now);
            None
        }
        KeyCode::Char('a') => {
            let Some(symbol) = app.next_unopened_market().map(|m| m.symbol.clone()) else {
                app.show_error("No more markets to open");
                return None;
            };
            app.store
                .open_symbol(&symbol, now)
                .map(|command| Action::Subscribe(command.symbol))
        }
        KeyCode::Char('x') => {
            let symbol = app.store.focused().to_string();
            let action = app
                .store
                .close_symbol(&symbol, now)
                .map(|command| Action::Unsubscribe(command.symbol));
            if action.is_none() {
                app.show_error("The last tab cannot be closed");
            }
            action
        }

        KeyCode::Char('g') => {
            app.chart_type.toggle();
            None
        }

        // Trade form
        KeyCode::Char('i') => {
            app.mode = Mode::Insert;
            None
        }
        KeyCode::Char('[') => {
            app.previous_duration();
            None
        }
        KeyCode::Char(']') => {
            app.next_duration();
            None
        }
        KeyCode::Char('u') => begin_trade(app, Direction::Up),
        KeyCode::Char('d') => begin_trade(app, Direction::Down),

        KeyCode::Char('L') => {
            if !app.authenticated {
                return None;
            }
            app.authenticated = false;
            app.user = None;
            app.show_info("Logged out");
            Some(Action::Logout)
        }

        _ => None,
    }
}

/// Validates the form and starts the verification gate.
fn begin_trade(app: &mut App, direction: Direction) -> Option<Action> {
    if !app.authenticated {
        app.show_error(SIGN_IN_REQUIRED);
        return None;
    }
    if app.trade_pending {
        app.show_error("A trade is already being submitted");
        return None;
    }

    if app.amount_input.is_empty() {
        app.alert("Enter an amount");
        return None;
    }
    let amount = match Decimal::from_str(app.amount_input.as_str().trim()) {
        Ok(amount) => amount,
        Err(_) => {
            app.alert(format!("Invalid amount {:?}", app.amount_input.as_str()));
            return None;
        }
    };
    let duration = app.duration();
    if let Err(e) = validate_trade_form(amount, duration) {
        warn!(%amount, duration, "Rejected trade form: {e}");
        app.alert(e.to_string());
        return None;
    }

    app.trade_pending = true;
    Some(Action::CheckVerification(TradeRequest {
        symbol: app.store.focused().to_string(),
        direction,
        amount,
        duration,
    }))
}

/// Handles keys in insert mode (amount editing).
fn handle_insert_mode(app: &mut App, key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => app.mode = Mode::Normal,
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => app.amount_input.insert(c),
        KeyCode::Backspace => app.amount_input.backspace(),
        KeyCode::Delete => app.amount_input.delete(),
        KeyCode::Left => app.amount_input.move_left(),
        KeyCode::Right => app.amount_input.move_right(),
        KeyCode::Home => app.amount_input.move_home(),
        KeyCode::End => app.amount_input.move_end(),
        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeedMessage;
    use crate::models::trade::{TradeResult, TradeStatus};
    use crate::state::Store;
    use crate::tui::app::NoticeKind;
    use crate::tui::input::text_input::TextInput;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn app(symbols: &[&str]) -> App {
        let store = Store::with_seed(symbols, 20, dec!(1000), now(), 3).unwrap();
        App::new(store, None, true, now())
    }

    fn key(code: KeyCode) -> Message {
        Message::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn market(symbol: &str) -> Market {
        Market {
            symbol: symbol.to_string(),
            name: String::new(),
            price: Decimal::ZERO,
            change_24h: Decimal::ZERO,
        }
    }

    fn trade(id: u64) -> Trade {
        Trade {
            id,
            symbol: "BTC/USDT".to_string(),
            direction: Direction::Up,
            amount: dec!(10),
            entry_price: dec!(67550.25),
            expires_at: now() + chrono::Duration::seconds(60),
            status: TradeStatus::Open,
        }
    }

    #[test]
    fn up_key_starts_verification_with_form_values() {
        let mut app = app(&["BTC/USDT"]);
        let action = update_at(&mut app, key(KeyCode::Char('u')), now());
        assert_eq!(
            action,
            Some(Action::CheckVerification(TradeRequest {
                symbol: "BTC/USDT".to_string(),
                direction: Direction::Up,
                amount: dec!(10),
                duration: 60,
            }))
        );
        assert!(app.trade_pending);

        // Second press while pending is refused.
        assert_eq!(update_at(&mut app, key(KeyCode::Char('d')), now()), None);
    }

    #[test]
    fn trading_requires_session() {
        let mut app = app(&["BTC/USDT"]);
        app.authenticated = false;
        assert_eq!(update_at(&mut app, key(KeyCode::Char('u')), now()), None);
        assert_eq!(app.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Error));
    }

    #[test]
    fn zero_amount_opens_alert() {
        let mut app = app(&["BTC/USDT"]);
        app.amount_input = TextInput::with_value("0");
        assert_eq!(update_at(&mut app, key(KeyCode::Char('u')), now()), None);
        assert!(matches!(app.modal, Some(Modal::Alert(_))));
        assert!(!app.trade_pending);
    }

    #[test]
    fn empty_amount_opens_alert() {
        let mut app = app(&["BTC/USDT"]);
        app.amount_input = TextInput::default();
        assert_eq!(update_at(&mut app, key(KeyCode::Char('u')), now()), None);
        assert_eq!(app.modal, Some(Modal::Alert("Enter an amount".to_string())));
    }

    #[test]
    fn failed_gate_opens_verification_modal() {
        let mut app = app(&["BTC/USDT"]);
        let Some(Action::CheckVerification(request)) =
            update_at(&mut app, key(KeyCode::Char('d')), now())
        else {
            panic!("expected verification check");
        };

        let action = update_at(
            &mut app,
            Message::VerificationChecked {
                request,
                result: Ok(VerificationStatus {
                    can_trade: false,
                    verification_required: true,
                }),
            },
            now(),
        );
        assert_eq!(action, None);
        assert_eq!(app.modal, Some(Modal::VerificationRequired));
        assert!(!app.trade_pending);

        // Modal swallows keys until dismissed.
        assert_eq!(update_at(&mut app, key(KeyCode::Char('q')), now()), None);
        assert!(!app.should_quit);
        update_at(&mut app, key(KeyCode::Esc), now());
        assert_eq!(app.modal, None);
    }

    #[test]
    fn passing_gate_submits_trade() {
        let mut app = app(&["BTC/USDT"]);
        let Some(Action::CheckVerification(request)) =
            update_at(&mut app, key(KeyCode::Char('u')), now())
        else {
            panic!("expected verification check");
        };
        let action = update_at(
            &mut app,
            Message::VerificationChecked {
                request: request.clone(),
                result: Ok(VerificationStatus {
                    can_trade: true,
                    verification_required: false,
                }),
            },
            now(),
        );
        assert_eq!(action, Some(Action::PlaceTrade(request)));
    }

    #[test]
    fn placed_trade_is_recorded_and_failure_alerts() {
        let mut app = app(&["BTC/USDT"]);
        app.trade_pending = true;
        update_at(&mut app, Message::TradePlaced(Ok(trade(7))), now());
        assert_eq!(app.store.ledger().open_trades().len(), 1);
        assert!(!app.trade_pending);

        update_at(
            &mut app,
            Message::TradePlaced(Err("Insufficient balance".to_string())),
            now(),
        );
        assert_eq!(
            app.modal,
            Some(Modal::Alert("Insufficient balance".to_string()))
        );
    }

    #[test]
    fn trade_result_from_feed_settles_and_notifies() {
        let mut app = app(&["BTC/USDT"]);
        update_at(&mut app, Message::TradePlaced(Ok(trade(7))), now());
        update_at(
            &mut app,
            Message::Feed(FeedEvent::Message(FeedMessage::TradeResult(TradeResult {
                id: 7,
                status: TradeOutcome::Won,
                profit: dec!(85),
            }))),
            now(),
        );
        assert!(app.store.ledger().open_trades().is_empty());
        assert_eq!(app.store.ledger().balance(), dec!(1085));
        assert_eq!(app.notice.as_ref().map(|n| n.kind), Some(NoticeKind::Info));
    }

    #[test]
    fn open_and_close_tabs_emit_feed_actions() {
        let mut app = app(&["BTC/USDT"]);
        app.markets = vec![market("BTC/USDT"), market("ETH/USDT")];

        let action = update_at(&mut app, key(KeyCode::Char('a')), now());
        assert_eq!(action, Some(Action::Subscribe("ETH/USDT".to_string())));
        assert_eq!(app.store.focused(), "ETH/USDT");

        // Nothing left to open.
        assert_eq!(update_at(&mut app, key(KeyCode::Char('a')), now()), None);

        let action = update_at(&mut app, key(KeyCode::Char('x')), now());
        assert_eq!(action, Some(Action::Unsubscribe("ETH/USDT".to_string())));
        assert_eq!(app.store.focused(), "BTC/USDT");

        // Last tab stays.
        assert_eq!(update_at(&mut app, key(KeyCode::Char('x')), now()), None);
        assert_eq!(app.store.subscriptions().len(), 1);
    }

    #[test]
    fn connection_status_follows_feed_events() {
        let mut app = app(&["BTC/USDT"]);
        update_at(&mut app, Message::Feed(FeedEvent::Connecting), now());
        assert_eq!(app.connection_status, ConnectionStatus::Connecting);
        update_at(&mut app, Message::Feed(FeedEvent::Connected), now());
        update_at(&mut app, Message::Feed(FeedEvent::Disconnected), now());
        update_at(&mut app, Message::Feed(FeedEvent::Connecting), now());
        assert_eq!(app.connection_status, ConnectionStatus::Reconnecting);
        update_at(&mut app, Message::Feed(FeedEvent::GaveUp), now());
        assert_eq!(app.connection_status, ConnectionStatus::Failed);
    }

    #[test]
    fn insert_mode_edits_amount() {
        let mut app = app(&["BTC/USDT"]);
        update_at(&mut app, key(KeyCode::Char('i')), now());
        assert_eq!(app.mode, Mode::Insert);
        update_at(&mut app, key(KeyCode::Char('5')), now());
        update_at(&mut app, key(KeyCode::Char('x')), now());
        update_at(&mut app, key(KeyCode::Enter), now());
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.amount_input.as_str(), "105");
    }

    #[test]
    fn logout_clears_session_state() {
        let mut app = app(&["BTC/USDT"]);
        assert_eq!(
            update_at(&mut app, key(KeyCode::Char('L')), now()),
            Some(Action::Logout)
        );
        assert!(!app.authenticated);
        assert_eq!(update_at(&mut app, key(KeyCode::Char('L')), now()), None);
    }
}
