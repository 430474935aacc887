use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState},
};

use crate::{
    app::{ExpenseBook, Focus, LoadPhase, UiState},
    ui::{
        components::{
            card::{Card, StatCard},
            money::{amount_span, balance_span, budget_gauge},
        },
        theme::Theme,
    },
};

pub fn render_balance(frame: &mut Frame<'_>, area: Rect, state: &UiState, book: &ExpenseBook) {
    let theme = Theme::default();
    let budget = book.budget();
    let symbol = state.currency_symbol.as_str();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(area);
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[0]);

    StatCard::new("Allowance", amount_span(budget.allowance, symbol, &theme), &theme)
        .render(frame, cards[0]);
    StatCard::new("Spent", amount_span(budget.total_spent, symbol, &theme), &theme)
        .render(frame, cards[1]);
    StatCard::new("Remaining", balance_span(&budget, symbol, &theme), &theme)
        .render(frame, cards[2]);
    frame.render_widget(budget_gauge(&budget, &theme), rows[1]);
}

pub fn render_form(frame: &mut Frame<'_>, area: Rect, state: &UiState, book: &ExpenseBook) {
    let theme = Theme::default();
    let disabled = !book.can_mutate() || book.is_saving();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let title = if book.is_saving() {
        "Saving…"
    } else {
        "Description"
    };
    render_input(
        frame,
        columns[0],
        Card::new(title, &theme)
            .focused(state.focus == Focus::Description)
            .dimmed(disabled),
        &state.form.description,
        state.focus == Focus::Description,
        &theme,
    );
    render_input(
        frame,
        columns[1],
        Card::new("Amount", &theme)
            .focused(state.focus == Focus::Amount)
            .dimmed(disabled),
        &state.form.amount,
        state.focus == Focus::Amount,
        &theme,
    );
}

fn render_input(
    frame: &mut Frame<'_>,
    area: Rect,
    card: Card<'_>,
    value: &str,
    focused: bool,
    theme: &Theme,
) {
    let cursor = if focused { "│" } else { "" };
    let style = if focused {
        Style::default().fg(theme.text)
    } else {
        Style::default().fg(theme.text_muted)
    };
    let content = Paragraph::new(Span::styled(format!("{value}{cursor}"), style));
    card.render_with(frame, area, content);
}

pub fn render_list(frame: &mut Frame<'_>, area: Rect, state: &UiState, book: &ExpenseBook) {
    let theme = Theme::default();
    let title = format!(
        "Expenses · {} · {}",
        book.period().label(),
        item_count(book.expenses().len())
    );
    let card = Card::new(&title, &theme).focused(state.focus == Focus::List);

    let placeholder = match book.phase() {
        LoadPhase::Idle | LoadPhase::Loading => Some("Loading expenses…"),
        LoadPhase::Failed => Some("Could not load expenses. Press r to retry."),
        LoadPhase::Ready if book.expenses().is_empty() => Some("No expenses this month."),
        LoadPhase::Ready => None,
    };
    if let Some(text) = placeholder {
        let line = Line::from(Span::styled(text, Style::default().fg(theme.text_muted)));
        card.render_with(frame, area, Paragraph::new(line));
        return;
    }

    let symbol = state.currency_symbol.as_str();
    let rows = book.expenses().iter().map(|expense| {
        let removing = book.is_removing(expense.id);
        let style = if removing {
            Style::default()
                .fg(theme.text_muted)
                .add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default().fg(theme.text)
        };
        let description = if removing {
            format!("{} (removing…)", expense.description)
        } else {
            expense.description.clone()
        };
        Row::new(vec![
            Cell::from(expense.occurred_on.clone()),
            Cell::from(description),
            Cell::from(Line::from(expense.amount.format_with(symbol)).right_aligned()),
        ])
        .style(style)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Min(10),
            Constraint::Length(14),
        ],
    )
    .header(
        Row::new(vec!["Date", "Description", "Amount"])
            .style(Style::default().fg(theme.accent)),
    )
    .column_spacing(2)
    .row_highlight_style(
        Style::default()
            .bg(theme.border)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("› ")
    .block(card.block());

    let mut table_state = TableState::default();
    if state.focus == Focus::List {
        table_state.select(Some(state.selected));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn item_count(count: usize) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{count} items")
    }
}

pub fn render_summary(frame: &mut Frame<'_>, area: Rect, state: &UiState, book: &ExpenseBook) {
    let theme = Theme::default();
    let card = Card::new("Month summary", &theme);
    let line = match book.summary() {
        Some(summary) => {
            let symbol = state.currency_symbol.as_str();
            let spent = engine::Amount::new(summary.total_gasto).format_with(symbol);
            let remaining = engine::Amount::new(summary.saldo_restante).format_with(symbol);
            Line::from(vec![
                Span::styled(summary.mes.clone(), Style::default().fg(theme.accent)),
                Span::raw(format!(
                    "  {} expenses · spent {spent} · remaining {remaining}",
                    summary.quantidade_gastos
                )),
            ])
        }
        None => Line::from(Span::styled(
            "Fetching summary…",
            Style::default().fg(theme.text_muted),
        )),
    };
    card.render_with(frame, area, Paragraph::new(line));
}
