//! Main event loop and generation event processing

use anyhow::Result;
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::Stdout;
use std::time::Duration;

use crate::constants::{POLL_TIMEOUT_BUSY_MS, POLL_TIMEOUT_MS};
use crate::generate::GenerateEvent;
use crate::input::{InputResult, handle_input};

use super::App;
use super::state::DraftState;

impl App {
    pub(crate) async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        loop {
            // Drain generation events first (non-blocking).
            if self.process_generate_events() {
                self.dirty = true;
            }

            // Clear expired errors
            if self.state.clear_error_if_expired() {
                self.dirty = true;
            }

            // Render only when something changed
            if self.dirty {
                terminal.draw(|f| crate::ui::render(f, &self.state))?;
                self.dirty = false;
            }

            // Poll faster while a draft is in flight so the completion event
            // shows up promptly.
            let poll_timeout = if self.state.draft.is_generating() {
                POLL_TIMEOUT_BUSY_MS
            } else {
                POLL_TIMEOUT_MS
            };
            if event::poll(Duration::from_millis(poll_timeout))? {
                let evt = event::read()?;
                // Any input event (including resize) requires re-render
                self.dirty = true;
                match handle_input(evt, &self.bindings) {
                    InputResult::Quit => break,
                    InputResult::Action(action) => self.handle_action(action).await,
                    InputResult::Char(c) => self.handle_char(c),
                    InputResult::Backspace => self.handle_backspace(),
                    InputResult::Enter => self.handle_enter(),
                    InputResult::Continue => {}
                }
            }
        }

        Ok(())
    }

    /// Drain completion events from the generation worker. Returns true if
    /// any event was processed.
    pub(crate) fn process_generate_events(&mut self) -> bool {
        let mut had_events = false;
        while let Ok(event) = self.generator.event_rx.try_recv() {
            had_events = true;
            match event {
                GenerateEvent::Completed { body } => {
                    self.state.draft = DraftState::Ready { body };
                    self.state.set_status("Draft ready - Ctrl+S to send");
                }
                GenerateEvent::Failed(e) => {
                    self.state.draft = DraftState::Empty;
                    self.state.set_error(e.to_string());
                }
            }
        }
        had_events
    }
}
