//! The draft form: three input fields, the draft pane and the bars

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::theme::Theme;
use super::widgets::{error_bar, help_bar, status_bar};
use crate::app::state::{AppState, DraftState, FormField};
use crate::mail::SessionState;

struct FormLayout {
    status_area: Rect,
    recipient_area: Rect,
    subject_area: Rect,
    purpose_area: Rect,
    draft_area: Rect,
    help_area: Rect,
}

fn compute_layout(area: Rect) -> FormLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Length(3), // Recipient field
            Constraint::Length(3), // Subject field
            Constraint::Length(5), // Purpose field
            Constraint::Min(0),    // Draft pane
            Constraint::Length(1), // Help bar
        ])
        .split(area);

    FormLayout {
        status_area: chunks[0],
        recipient_area: chunks[1],
        subject_area: chunks[2],
        purpose_area: chunks[3],
        draft_area: chunks[4],
        help_area: chunks[5],
    }
}

pub fn render_form(frame: &mut Frame, state: &AppState) {
    let layout = compute_layout(frame.area());

    let session_label = match state.session {
        SessionState::Authenticated => "signed in",
        SessionState::Authenticating => "authorizing...",
        SessionState::Refreshing => "refreshing...",
        SessionState::LoggedOut => "logged out",
        SessionState::Unauthenticated => "not signed in",
    };
    let message = state.status.message.as_deref().unwrap_or("quill");
    status_bar(frame, layout.status_area, message, session_label);

    render_field(
        frame,
        layout.recipient_area,
        "Recipient",
        &state.form.recipient,
        state.form.focus == FormField::Recipient,
    );
    render_field(
        frame,
        layout.subject_area,
        "Subject",
        &state.form.subject,
        state.form.focus == FormField::Subject,
    );
    render_field(
        frame,
        layout.purpose_area,
        "Purpose",
        &state.form.purpose,
        state.form.focus == FormField::Purpose,
    );

    render_draft(frame, layout.draft_area, &state.draft);

    if let Some(ref error) = state.status.error {
        error_bar(frame, layout.help_area, error);
    } else {
        let hints: &[(&str, &str)] = if state.draft.is_generating() {
            &[("Tab", "next field"), ("Esc", "quit")]
        } else if state.can_send() {
            &[
                ("Tab", "next field"),
                ("Ctrl+G", "generate"),
                ("Ctrl+S", "send"),
                ("Ctrl+L", "logout"),
                ("Esc", "quit"),
            ]
        } else {
            &[
                ("Tab", "next field"),
                ("Ctrl+G", "generate"),
                ("Ctrl+L", "logout"),
                ("Esc", "quit"),
            ]
        };
        help_bar(frame, layout.help_area, hints);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let border_style = if focused {
        Theme::border_focused()
    } else {
        Theme::border()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {} ", label));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let style = if focused {
        Theme::text()
    } else {
        Theme::text_secondary()
    };

    let text = if focused {
        format!("{}│", value)
    } else {
        value.to_string()
    };

    let paragraph = Paragraph::new(text).style(style).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

fn render_draft(frame: &mut Frame, area: Rect, draft: &DraftState) {
    let title = match draft {
        DraftState::Empty => " Draft ".to_string(),
        DraftState::Generating => " Draft (generating...) ".to_string(),
        DraftState::Ready { body } => format!(" Draft ({} chars) ", body.chars().count()),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Theme::border())
        .title(title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (text, style) = match draft {
        DraftState::Empty => (
            "No draft yet. Fill in the form and press Ctrl+G.",
            Theme::text_muted(),
        ),
        DraftState::Generating => ("Waiting for the model...", Theme::text_muted()),
        DraftState::Ready { body } => (body.as_str(), Theme::text()),
    };

    let paragraph = Paragraph::new(text).style(style).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}
