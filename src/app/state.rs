//! Application state types
//!
//! All state types live here to maintain clean dependency:
//! UI layer imports from app layer, not vice versa.

use std::time::Instant;

use crate::constants::ERROR_TTL_SECS;
use crate::mail::SessionState;

/// Which form field has focus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormField {
    #[default]
    Recipient,
    Subject,
    Purpose,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            Self::Recipient => Self::Subject,
            Self::Subject => Self::Purpose,
            Self::Purpose => Self::Recipient,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Recipient => Self::Purpose,
            Self::Subject => Self::Recipient,
            Self::Purpose => Self::Subject,
        }
    }
}

/// Lifecycle of the current draft. `Generating` disables the generate
/// action; only `Ready` enables the send action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DraftState {
    #[default]
    Empty,
    Generating,
    Ready { body: String },
}

impl DraftState {
    pub fn is_generating(&self) -> bool {
        matches!(self, Self::Generating)
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Ready { body } => Some(body),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub recipient: String,
    pub subject: String,
    pub purpose: String,
    pub focus: FormField,
}

impl FormState {
    pub fn focused_value_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Recipient => &mut self.recipient,
            FormField::Subject => &mut self.subject,
            FormField::Purpose => &mut self.purpose,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub error: Option<String>,
    pub error_since: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub form: FormState,
    pub draft: DraftState,
    pub session: SessionState,
    pub status: StatusState,
}

impl AppState {
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status.message = Some(message.into());
        self.status.error = None;
        self.status.error_since = None;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status.error = Some(message.into());
        self.status.error_since = Some(Instant::now());
    }

    /// Drop the error once its display window has passed. Returns true if
    /// the state changed.
    pub fn clear_error_if_expired(&mut self) -> bool {
        if let Some(since) = self.status.error_since
            && since.elapsed().as_secs() >= ERROR_TTL_SECS
        {
            self.status.error = None;
            self.status.error_since = None;
            return true;
        }
        false
    }

    /// Whether the send action is currently available.
    pub fn can_send(&self) -> bool {
        matches!(self.draft, DraftState::Ready { .. })
    }
}
