//! Centralized theming for the quill TUI
//!
//! Single source of truth for the colors and styles used by the form.

use ratatui::style::{Color, Modifier, Style};
use std::sync::RwLock;

use crate::config::ThemeVariant;

/// Global theme variant storage (set once at startup)
static THEME_VARIANT: RwLock<ThemeVariant> = RwLock::new(ThemeVariant::Dark);

/// Initialize the theme variant (call once at startup)
pub fn init_theme(variant: ThemeVariant) {
    if let Ok(mut guard) = THEME_VARIANT.write() {
        *guard = variant;
    }
}

fn current() -> ThemeVariant {
    THEME_VARIANT.read().map(|g| *g).unwrap_or_default()
}

pub struct Theme;

impl Theme {
    pub fn text() -> Style {
        match current() {
            ThemeVariant::Dark => Style::default().fg(Color::White),
            ThemeVariant::HighContrast => {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            }
        }
    }

    pub fn text_secondary() -> Style {
        match current() {
            ThemeVariant::Dark => Style::default().fg(Color::Gray),
            ThemeVariant::HighContrast => Style::default().fg(Color::White),
        }
    }

    pub fn text_muted() -> Style {
        match current() {
            ThemeVariant::Dark => Style::default().fg(Color::DarkGray),
            ThemeVariant::HighContrast => Style::default().fg(Color::Gray),
        }
    }

    pub fn text_accent() -> Style {
        match current() {
            ThemeVariant::Dark => Style::default().fg(Color::Cyan),
            ThemeVariant::HighContrast => {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            }
        }
    }

    pub fn border() -> Style {
        match current() {
            ThemeVariant::Dark => Style::default().fg(Color::DarkGray),
            ThemeVariant::HighContrast => Style::default().fg(Color::White),
        }
    }

    pub fn border_focused() -> Style {
        match current() {
            ThemeVariant::Dark => Style::default().fg(Color::Cyan),
            ThemeVariant::HighContrast => {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            }
        }
    }

    pub fn status_bar() -> Style {
        match current() {
            ThemeVariant::Dark => Style::default().fg(Color::Black).bg(Color::Cyan),
            ThemeVariant::HighContrast => Style::default().fg(Color::Black).bg(Color::Yellow),
        }
    }

    pub fn error_bar() -> Style {
        Style::default().fg(Color::White).bg(Color::Red)
    }

    pub fn help_key() -> Style {
        Self::text_accent()
    }

    pub fn help_desc() -> Style {
        Self::text_secondary()
    }
}
