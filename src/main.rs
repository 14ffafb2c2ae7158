use std::fs::OpenOptions;
use std::sync::Mutex;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tormentus::api::{ApiClient, TRADE_FAILED_FALLBACK};
use tormentus::config::{AppConfig, fetch_config};
use tormentus::feed::{ConnectionCommand, ConnectionManager};
use tormentus::session::SessionStore;
use tormentus::state::Store;
use tormentus::tui::{self, Action, App, Message, Tui};
use tormentus::{Result, TormentusError};

/// Countdown and notice refresh interval.
const TICK_INTERVAL_MS: u64 = 1_000;

#[tokio::main]
async fn main() -> Result<()> {
    let config = fetch_config()?;
    init_tracing(&config)?;
    info!(api = %config.api.base_url, feed = %config.feed.websocket_url, "Starting tormentus");

    let session_store = SessionStore::from_config(config.session_file.as_deref());
    let session = session_store.load();
    let authenticated = session.is_authenticated();
    let balance = session
        .user
        .as_ref()
        .map_or(Decimal::ZERO, |user| user.balance);

    let api = ApiClient::new(&config.api, session.token.clone())?;

    let now = Utc::now();
    let store = Store::new(&config.ui.symbols, config.ui.chart_candles, balance, now)?;
    let mut app = App::new(store, session.user, authenticated, now);

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ConnectionCommand>();
    let cancel = CancellationToken::new();

    let manager = ConnectionManager::new(
        config.feed.websocket_url.clone(),
        config.feed.reconnect,
        config.ui.symbols.clone(),
        tx.clone(),
        cmd_rx,
        cancel.clone(),
    );
    let feed_task = tokio::spawn(manager.run());

    spawn_snapshot_requests(&api, &tx);

    let mut terminal = tui::setup_terminal()?;
    tui::event::spawn_event_reader(tx.clone());
    tui::event::spawn_tick_timer(tx.clone(), TICK_INTERVAL_MS);

    let mut ctx = Context {
        api,
        session_store,
        tx,
        cmd_tx,
    };
    let result = run(&mut terminal, &mut app, &mut rx, &mut ctx).await;

    cancel.cancel();
    tui::restore_terminal(&mut terminal)?;
    match feed_task.await {
        Ok(reason) => info!(?reason, "Feed task stopped"),
        Err(e) => warn!("Feed task failed: {e}"),
    }
    result
}

/// Handles the UI needs to perform side effects.
struct Context {
    api: ApiClient,
    session_store: SessionStore,
    tx: mpsc::UnboundedSender<Message>,
    cmd_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

/// Draw/update loop; every state change goes through [`tui::update`].
async fn run(
    terminal: &mut Tui,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<Message>,
    ctx: &mut Context,
) -> Result<()> {
    draw(terminal, app)?;

    while let Some(message) = rx.recv().await {
        if let Some(action) = tui::update(app, message) {
            perform(action, ctx);
        }
        if app.should_quit {
            break;
        }
        draw(terminal, app)?;
    }
    Ok(())
}

fn draw(terminal: &mut Tui, app: &App) -> Result<()> {
    terminal
        .draw(|frame| tui::render(frame, app))
        .map_err(|e| TormentusError::Io(format!("failed to draw: {e}")))?;
    Ok(())
}

/// Executes an action requested by the update function.
fn perform(action: Action, ctx: &mut Context) {
    match action {
        Action::Subscribe(symbol) => {
            if ctx.cmd_tx.send(ConnectionCommand::Subscribe(symbol)).is_err() {
                warn!("Feed task is gone; subscribe dropped");
            }
        }
        Action::Unsubscribe(symbol) => {
            if ctx.cmd_tx.send(ConnectionCommand::Unsubscribe(symbol)).is_err() {
                warn!("Feed task is gone; unsubscribe dropped");
            }
        }
        Action::CheckVerification(request) => {
            let api = ctx.api.clone();
            let tx = ctx.tx.clone();
            tokio::spawn(async move {
                let result = api
                    .check_verification()
                    .await
                    .map_err(|e| e.user_message("Failed to check verification"));
                let _ = tx.send(Message::VerificationChecked { request, result });
            });
        }
        Action::PlaceTrade(request) => {
            let api = ctx.api.clone();
            let tx = ctx.tx.clone();
            tokio::spawn(async move {
                let result = api.place_trade(&request).await.map_err(|e| {
                    error!(symbol = %request.symbol, "Trade submission failed: {e}");
                    e.user_message(TRADE_FAILED_FALLBACK)
                });
                let _ = tx.send(Message::TradePlaced(result));
            });
        }
        Action::Logout => {
            if let Err(e) = ctx.session_store.clear() {
                error!("Failed to clear session: {e}");
            }
            ctx.api.set_token(None);
        }
    }
}

/// Loads the market list and price snapshot in the background.
fn spawn_snapshot_requests(api: &ApiClient, tx: &mpsc::UnboundedSender<Message>) {
    let markets_api = api.clone();
    let markets_tx = tx.clone();
    tokio::spawn(async move {
        let result = markets_api
            .markets()
            .await
            .map_err(|e| e.user_message("Failed to load markets"));
        let _ = markets_tx.send(Message::MarketsLoaded(result));
    });

    let prices_api = api.clone();
    let prices_tx = tx.clone();
    tokio::spawn(async move {
        let result = prices_api
            .prices()
            .await
            .map_err(|e| e.user_message("Failed to load prices"));
        let _ = prices_tx.send(Message::PricesLoaded(result));
    });
}

/// Sends tracing output to the log file so the dashboard owns the terminal.
fn init_tracing(config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| {
            TormentusError::Io(format!(
                "failed to open log file {}: {e}",
                config.log_file.display()
            ))
        })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
