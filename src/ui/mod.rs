//! UI rendering

mod form;
pub mod theme;
mod widgets;

use ratatui::Frame;

use crate::app::state::AppState;

pub fn render(frame: &mut Frame, state: &AppState) {
    form::render_form(frame, state);
}
