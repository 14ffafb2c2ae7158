//! Widgets shared across tabs.

pub mod status_bar;
pub mod tab_bar;
