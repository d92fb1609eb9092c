//! Action handlers for the draft workflow

use crate::generate::{DraftRequest, GenerateCommand};
use crate::input::Action;
use crate::mail::LogoutOutcome;
use crate::validate;

use super::App;
use super::state::{DraftState, FormField};

impl App {
    pub(crate) async fn handle_action(&mut self, action: Action) {
        match action {
            Action::NextField => self.state.form.focus = self.state.form.focus.next(),
            Action::PrevField => self.state.form.focus = self.state.form.focus.prev(),
            Action::Generate => self.generate_draft().await,
            Action::Send => self.send_draft().await,
            Action::Logout => self.logout(),
            Action::Quit => {}
        }
    }

    pub(crate) fn handle_char(&mut self, c: char) {
        self.state.form.focused_value_mut().push(c);
    }

    pub(crate) fn handle_backspace(&mut self) {
        self.state.form.focused_value_mut().pop();
    }

    /// Enter inserts a newline in the purpose field; the other fields are
    /// single-line.
    pub(crate) fn handle_enter(&mut self) {
        if self.state.form.focus == FormField::Purpose {
            self.state.form.purpose.push('\n');
        }
    }

    /// Validate the form and hand the request to the generation worker.
    pub(crate) async fn generate_draft(&mut self) {
        // Only one request may be in flight at a time.
        if self.state.draft.is_generating() {
            self.state.set_status("Draft generation already in progress");
            return;
        }

        let form = &self.state.form;
        if let Err(e) = validate::validate(&form.recipient, &form.subject, &form.purpose) {
            self.state.set_error(e.to_string());
            return;
        }

        let request = DraftRequest {
            recipient: form.recipient.clone(),
            subject: form.subject.clone(),
            purpose: form.purpose.clone(),
        };

        self.state.draft = DraftState::Generating;
        self.state.set_status("Generating draft...");

        if self
            .generator
            .cmd_tx
            .send(GenerateCommand::Draft { request })
            .await
            .is_err()
        {
            self.state.draft = DraftState::Empty;
            self.state.set_error("Generation worker is not running");
        }
    }

    /// Send the generated draft through the Gmail API.
    ///
    /// Runs inline on the event-loop thread; the UI stalls for the duration
    /// of the call.
    pub(crate) async fn send_draft(&mut self) {
        let Some(body) = self.state.draft.body().map(|b| b.to_string()) else {
            self.state.set_error("Generate a draft before sending");
            return;
        };

        let token = match self.session.access_token().await {
            Ok(token) => token,
            Err(e) => {
                self.state.session = self.session.state();
                self.state.set_error(e.to_string());
                return;
            }
        };
        self.state.session = self.session.state();

        let to = self.state.form.recipient.clone();
        let subject = self.state.form.subject.clone();
        match self
            .mailer
            .send(&token, &self.config.mail.sender, &to, &subject, &body)
            .await
        {
            Ok(id) => {
                tracing::info!("Sent draft to {} (id {})", to, id);
                self.state.set_status("Email sent successfully");
            }
            Err(e) => self.state.set_error(e.to_string()),
        }
    }

    /// Drop the persisted token and reset the session in place. The next
    /// send re-enters the authorization flow from scratch.
    pub(crate) fn logout(&mut self) {
        match self.session.logout() {
            Ok(LogoutOutcome::LoggedOut) => {
                self.state.draft = DraftState::Empty;
                self.state.set_status("Logged out");
            }
            Ok(LogoutOutcome::NotLoggedIn) => self.state.set_status("You are not logged in"),
            Err(e) => self.state.set_error(format!("Logout failed: {}", e)),
        }
        self.state.session = self.session.state();
    }
}
