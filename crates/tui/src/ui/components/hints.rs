use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A keyboard hint consisting of a key and its action.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: &'static str,
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(theme.accent)));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

pub mod common {
    use super::KeyHint;

    pub fn form_editing() -> Vec<KeyHint> {
        vec![
            KeyHint::new("Tab", "next"),
            KeyHint::new("Enter", "add"),
            KeyHint::new("Esc", "list"),
        ]
    }

    pub fn list_actions() -> Vec<KeyHint> {
        vec![
            KeyHint::new("↑↓", "select"),
            KeyHint::new("d", "remove"),
            KeyHint::new("a", "add"),
            KeyHint::new("[ ]", "month"),
            KeyHint::new("m", "pick month"),
            KeyHint::new("r", "reload"),
            KeyHint::new("s", "summary"),
        ]
    }

    pub fn picker() -> Vec<KeyHint> {
        vec![
            KeyHint::new("↑↓", "select"),
            KeyHint::new("Enter", "open"),
            KeyHint::new("Esc", "close"),
        ]
    }
}
