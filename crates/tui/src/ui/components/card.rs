use ratatui::{
    Frame,
    layout::Rect,
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use crate::ui::theme::Theme;

/// Rounded panel used for every section of the screen.
pub struct Card<'a> {
    title: &'a str,
    theme: &'a Theme,
    focused: bool,
    dimmed: bool,
}

impl<'a> Card<'a> {
    pub fn new(title: &'a str, theme: &'a Theme) -> Self {
        Self {
            title,
            theme,
            focused: false,
            dimmed: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Greys the border out, for inputs that cannot be used right now.
    pub fn dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }

    pub fn block(&self) -> Block<'a> {
        let border_color = if self.dimmed {
            self.theme.text_muted
        } else if self.focused {
            self.theme.border_focused
        } else {
            self.theme.border
        };

        Block::default()
            .title(Span::styled(
                format!(" {} ", self.title),
                Style::default().fg(self.theme.accent),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(self.theme.surface))
    }

    pub fn inner(&self, area: Rect) -> Rect {
        self.block().inner(area)
    }

    pub fn render_with<W: Widget>(&self, frame: &mut Frame<'_>, area: Rect, content: W) {
        let inner = self.inner(area);
        frame.render_widget(self.block(), area);
        frame.render_widget(content, inner);
    }
}

/// A card showing one figure.
pub struct StatCard<'a> {
    title: &'a str,
    value: Span<'static>,
    theme: &'a Theme,
}

impl<'a> StatCard<'a> {
    pub fn new(title: &'a str, value: Span<'static>, theme: &'a Theme) -> Self {
        Self {
            title,
            value,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let value = self.value.clone().bold();
        Card::new(self.title, self.theme).render_with(frame, area, Paragraph::new(Line::from(value)));
    }
}
