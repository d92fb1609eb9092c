//! Common UI widgets and utilities

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;

/// One-line status bar: message on the left, session label on the right.
pub fn status_bar(frame: &mut Frame, area: Rect, message: &str, session: &str) {
    let left = Paragraph::new(format!(" {}", message)).style(Theme::status_bar());
    frame.render_widget(left, area);

    let label = format!("{} ", session);
    let width = (label.width() as u16).min(area.width);
    if !session.is_empty() && width < area.width {
        let right_area = Rect {
            x: area.x + area.width - width,
            y: area.y,
            width,
            height: area.height,
        };
        let right = Paragraph::new(label).style(Theme::status_bar());
        frame.render_widget(right, right_area);
    }
}

pub fn error_bar(frame: &mut Frame, area: Rect, message: &str) {
    let paragraph = Paragraph::new(format!(" Error: {} ", message)).style(Theme::error_bar());
    frame.render_widget(paragraph, area);
}

pub fn help_bar(frame: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let available_width = area.width as usize;

    // Fit as many hints as the width allows, separator included.
    let mut total_width = 0;
    let mut hints_to_show = 0;
    for (i, (key, desc)) in hints.iter().enumerate() {
        let mut width = format!(" {} ", key).width() + desc.width();
        width += if i < hints.len() - 1 { 3 } else { 1 };
        if total_width + width > available_width {
            break;
        }
        total_width += width;
        hints_to_show += 1;
    }
    hints_to_show = hints_to_show.max(1).min(hints.len());

    let mut spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints.iter().take(hints_to_show).enumerate() {
        spans.push(Span::styled(format!(" {} ", key), Theme::help_key()));
        spans.push(Span::styled(desc.to_string(), Theme::help_desc()));
        if i < hints_to_show - 1 {
            spans.push(Span::styled(" │ ", Theme::text_muted()));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans));
    frame.render_widget(paragraph, area);
}
