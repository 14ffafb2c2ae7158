//! TORMENTUS binary-options terminal client.
//!
//! Streams live quotes over the price feed WebSocket, keeps a per-symbol
//! quote cache and a placeholder candle chart for the focused symbol,
//! tracks open trades until the server settles them, and submits new
//! trades through the REST API.

pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod session;
pub mod state;
pub mod tui;

pub use error::{Result, TormentusError};
