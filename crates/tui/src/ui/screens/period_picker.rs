use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, ListState},
};

use crate::{
    app::{ExpenseBook, PickerState},
    ui::{components::card::Card, theme::Theme},
};

fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

/// Month list; months holding expenses are marked with a dot.
pub fn render(frame: &mut Frame<'_>, area: Rect, picker: &PickerState, book: &ExpenseBook) {
    let theme = Theme::default();
    let rect = centered_box(30, area.height.min(16), area);
    frame.render_widget(Clear, rect);

    let items: Vec<ListItem<'_>> = picker
        .periods
        .iter()
        .map(|period| {
            let marker = if book.active_periods().contains(period) {
                Span::styled("• ", Style::default().fg(theme.positive))
            } else {
                Span::raw("  ")
            };
            let label_style = if *period == book.period() {
                Style::default().fg(theme.accent)
            } else {
                Style::default().fg(theme.text)
            };
            ListItem::new(Line::from(vec![
                marker,
                Span::styled(period.label(), label_style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Card::new("Pick a month", &theme).focused(true).block())
        .highlight_style(
            Style::default()
                .bg(theme.border)
                .add_modifier(Modifier::BOLD),
        );
    let mut state = ListState::default();
    state.select(Some(picker.selected));
    frame.render_stateful_widget(list, rect, &mut state);
}
