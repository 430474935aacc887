pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
};

use crate::app::{Connectivity, ExpenseBook, Focus, UiState};

use components::hints::{self, hint_separator, hints_to_spans};

pub use terminal::{AppTerminal as Terminal, install_panic_hook, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &UiState, book: &ExpenseBook) {
    let theme = Theme::default();
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme.background)), area);

    let error_height = if book.error().is_some() { 1 } else { 0 };
    let summary_height = if state.show_summary { 3 } else { 0 };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),              // Info bar
            Constraint::Length(error_height),   // Error banner
            Constraint::Length(4),              // Balance
            Constraint::Length(3),              // Form
            Constraint::Min(3),                 // Expenses
            Constraint::Length(summary_height), // Summary
            Constraint::Length(1),              // Bottom bar
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, book, &theme);
    if let Some(error) = book.error() {
        render_error(frame, layout[1], error, &theme);
    }
    screens::expenses::render_balance(frame, layout[2], state, book);
    screens::expenses::render_form(frame, layout[3], state, book);
    screens::expenses::render_list(frame, layout[4], state, book);
    if state.show_summary {
        screens::expenses::render_summary(frame, layout[5], state, book);
    }
    render_bottom_bar(frame, layout[6], state, &theme);

    if let Some(picker) = &state.picker {
        screens::period_picker::render(frame, area, picker, book);
    }
    components::toast::render(frame, area, state.toast.as_ref());
}

fn render_info_bar(
    frame: &mut Frame<'_>,
    area: Rect,
    state: &UiState,
    book: &ExpenseBook,
    theme: &Theme,
) {
    let (status, status_style) = match book.connectivity() {
        Connectivity::Reachable => ("● API online", Style::default().fg(theme.positive)),
        Connectivity::Unreachable => ("● API offline", Style::default().fg(theme.error)),
    };
    let allowance = book.allowance().format_with(&state.currency_symbol);

    let line = Line::from(vec![
        Span::styled("Gastos", Style::default().fg(theme.accent)),
        Span::raw("  "),
        Span::styled("Month", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", book.period().label())),
        Span::styled("Allowance", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {allowance}  ")),
        Span::styled(status, status_style),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_error(frame: &mut Frame<'_>, area: Rect, error: &str, theme: &Theme) {
    let line = Line::from(vec![
        Span::styled(format!("✗ {error}"), Style::default().fg(theme.error)),
        Span::styled("  (x to dismiss)", Style::default().fg(theme.text_muted)),
    ]);
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &UiState, theme: &Theme) {
    let context = if state.picker.is_some() {
        hints::common::picker()
    } else if state.focus == Focus::List {
        hints::common::list_actions()
    } else {
        hints::common::form_editing()
    };

    let mut parts = hints_to_spans(&context, theme);
    parts.push(hint_separator(theme));
    parts.push(Span::styled(
        if state.focus == Focus::List { "q" } else { "Ctrl+C" },
        Style::default().fg(theme.accent),
    ));
    parts.push(Span::raw(" quit"));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}
