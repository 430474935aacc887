use engine::{Amount, BudgetState};
use ratatui::{
    style::{Color, Style},
    text::Span,
    widgets::Gauge,
};

use crate::ui::theme::Theme;

/// Plain amount, no sign coloring.
#[must_use]
pub fn amount_span(amount: Amount, symbol: &str, theme: &Theme) -> Span<'static> {
    Span::styled(amount.format_with(symbol), Style::default().fg(theme.text))
}

/// Remaining balance: red once negative, amber when nearly spent.
#[must_use]
pub fn balance_span(budget: &BudgetState, symbol: &str, theme: &Theme) -> Span<'static> {
    let color = if budget.is_overspent() {
        theme.negative
    } else {
        usage_color(budget.usage(), theme)
    };
    Span::styled(budget.remaining.format_with(symbol), Style::default().fg(color))
}

/// Green below 70% of the allowance, warning up to 90%, red above.
fn usage_color(ratio: f64, theme: &Theme) -> Color {
    if ratio < 0.7 {
        theme.positive
    } else if ratio < 0.9 {
        theme.warning
    } else {
        theme.negative
    }
}

#[must_use]
pub fn budget_gauge(budget: &BudgetState, theme: &Theme) -> Gauge<'static> {
    let ratio = budget.usage();
    let percentage = (ratio * 100.0).round() as u16;

    Gauge::default()
        .gauge_style(Style::default().fg(usage_color(ratio, theme)))
        .percent(percentage.min(100))
        .label(format!("{percentage}% of the allowance spent"))
}

/// Text bar like `████████░░ 80%`.
#[must_use]
pub fn inline_progress_bar(ratio: f64, width: usize) -> String {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = ((ratio * width as f64) as usize).min(width);
    let empty = width.saturating_sub(filled);
    let percentage = (ratio * 100.0) as u16;

    format!("{}{} {}%", "█".repeat(filled), "░".repeat(empty), percentage)
}
