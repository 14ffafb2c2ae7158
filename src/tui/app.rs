//! Application state for the TUI.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::api::ALLOWED_DURATIONS;
use crate::models::market::{Market, UserProfile};
use crate::state::Store;

use super::input::text_input::TextInput;

/// How long a notice stays in the status bar.
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Amount pre-filled in the trade form.
const DEFAULT_AMOUNT: &str = "10";

/// Index into [`ALLOWED_DURATIONS`] selected at start (60s).
const DEFAULT_DURATION_INDEX: usize = 1;

/// Central application state container.
pub struct App {
    // -- Market & trade state --
    /// Quotes, chart, subscriptions and the trade ledger.
    pub store: Store,
    /// Markets listed by the REST API, in server order.
    pub markets: Vec<Market>,

    // -- Session --
    /// Signed-in user, if the session carries one.
    pub user: Option<UserProfile>,
    /// Whether a session token is present; trading is disabled without one.
    pub authenticated: bool,

    // -- Trade form --
    pub amount_input: TextInput,
    /// Index into [`ALLOWED_DURATIONS`].
    pub duration_index: usize,
    /// A verification check or submission is in flight.
    pub trade_pending: bool,

    // -- UI state --
    pub mode: Mode,
    pub chart_type: ChartType,
    /// Blocking dialog; swallows input until dismissed.
    pub modal: Option<Modal>,
    /// Transient status-bar message (clears after timeout).
    pub notice: Option<Notice>,
    /// Wall-clock time of the last tick; drives countdowns.
    pub now: DateTime<Utc>,

    // -- Connection state --
    pub connection_status: ConnectionStatus,
    /// Set once the feed has connected at least once.
    pub has_connected: bool,

    pub should_quit: bool,
}

impl App {
    /// Creates the app around an initialized store.
    pub fn new(store: Store, user: Option<UserProfile>, authenticated: bool, now: DateTime<Utc>) -> Self {
        Self {
            store,
            markets: Vec::new(),
            user,
            authenticated,
            amount_input: TextInput::with_value(DEFAULT_AMOUNT),
            duration_index: DEFAULT_DURATION_INDEX,
            trade_pending: false,
            mode: Mode::Normal,
            chart_type: ChartType::Candle,
            modal: None,
            notice: None,
            now,
            connection_status: ConnectionStatus::Disconnected,
            has_connected: false,
            should_quit: false,
        }
    }

    /// Selected trade duration in seconds.
    pub fn duration(&self) -> u32 {
        ALLOWED_DURATIONS[self.duration_index.min(ALLOWED_DURATIONS.len() - 1)]
    }

    /// Selects the next longer duration, stopping at the longest.
    pub fn next_duration(&mut self) {
        if self.duration_index + 1 < ALLOWED_DURATIONS.len() {
            self.duration_index += 1;
        }
    }

    /// Selects the next shorter duration, stopping at the shortest.
    pub fn previous_duration(&mut self) {
        self.duration_index = self.duration_index.saturating_sub(1);
    }

    /// First listed market that does not have a tab yet.
    pub fn next_unopened_market(&self) -> Option<&Market> {
        self.markets
            .iter()
            .find(|m| !self.store.subscriptions().contains(&m.symbol))
    }

    /// Display name for a symbol, falling back to the symbol itself.
    pub fn market_name<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.markets
            .iter()
            .find(|m| m.symbol == symbol && !m.name.is_empty())
            .map_or(symbol, |m| m.name.as_str())
    }

    /// Opens a blocking alert.
    pub fn alert(&mut self, message: impl Into<String>) {
        self.modal = Some(Modal::Alert(message.into()));
    }

    /// Shows an error in the status bar.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice::new(message, NoticeKind::Error));
    }

    /// Shows a success message in the status bar.
    pub fn show_info(&mut self, message: impl Into<String>) {
        self.notice = Some(Notice::new(message, NoticeKind::Info));
    }

    /// Clears notices older than five seconds.
    pub fn clear_stale_notices(&mut self) {
        if let Some(ref notice) = self.notice
            && notice.timestamp.elapsed() > NOTICE_TTL
        {
            self.notice = None;
        }
    }
}

/// Blocking dialogs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Modal {
    /// Trade submission failed; carries the server error text.
    Alert(String),
    /// The account must be verified before trading.
    VerificationRequired,
}

impl Modal {
    pub fn title(&self) -> &'static str {
        match self {
            Modal::Alert(_) => " Trade failed ",
            Modal::VerificationRequired => " Verification required ",
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Modal::Alert(message) => message,
            Modal::VerificationRequired => {
                "Your account must be verified before you can trade. \
                 Complete verification on the website, then try again."
            }
        }
    }
}

/// Chart display type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChartType {
    #[default]
    Candle,
    Line,
}

impl ChartType {
    /// Toggles between chart types.
    pub fn toggle(&mut self) {
        *self = match self {
            ChartType::Candle => ChartType::Line,
            ChartType::Line => ChartType::Candle,
        };
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartType::Candle => "Candle",
            ChartType::Line => "Line",
        }
    }
}

/// Input mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Editing the trade amount.
    Insert,
}

/// Feed connection status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Reconnect attempts exhausted.
    Failed,
}

impl ConnectionStatus {
    /// Returns a display string for the status.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Offline",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Live",
            ConnectionStatus::Reconnecting => "Reconnecting...",
            ConnectionStatus::Failed => "Feed unavailable",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Status-bar message with timestamp for auto-clear.
#[derive(Clone, Debug)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    pub timestamp: Instant,
}

impl Notice {
    fn new(message: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            message: message.into(),
            kind,
            timestamp: Instant::now(),
        }
    }
}
