//! Main UI rendering coordinator.

use ratatui::Frame;

use super::app::App;
use super::tabs::asset;

/// Renders the entire application UI.
///
/// Every tab shows the same asset layout for the focused symbol.
pub fn render(frame: &mut Frame, app: &App) {
    asset::render(frame, app);
}
