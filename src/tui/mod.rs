//! Terminal dashboard for the TORMENTUS quote feed.
//!
//! Provides a Ratatui-based TUI with a tab per subscribed symbol, live
//! price header and chart, open trades with countdowns and a trade form.

pub mod app;
pub mod components;
pub mod event;
pub mod format;
pub mod input;
pub mod tabs;
pub mod terminal;
pub mod ui;

pub use app::App;
pub use event::{Action, Event, Message, update};
pub use terminal::{Tui, restore_terminal, setup_terminal};
pub use ui::render;
