use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use engine::Period;

use crate::{
    client::{ExpenseGateway, HttpGateway},
    config::AppConfig,
    error::{AppError, Result},
    ui::{
        self,
        keymap::{AppAction, map_key},
    },
};

pub mod book;
pub mod sync;

pub use book::{Connectivity, ExpenseBook, LoadPhase, Notice};
pub use sync::Synchronizer;

const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Description,
    Amount,
    List,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Description => Self::Amount,
            Self::Amount => Self::List,
            Self::List => Self::Description,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Description => Self::List,
            Self::Amount => Self::Description,
            Self::List => Self::Amount,
        }
    }

    pub fn is_typing(self) -> bool {
        self != Self::List
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    shown_at: Instant,
}

#[derive(Debug, Default)]
pub struct FormState {
    pub description: String,
    pub amount: String,
}

impl FormState {
    fn clear(&mut self) {
        self.description.clear();
        self.amount.clear();
    }
}

/// Month picker overlay.
#[derive(Debug)]
pub struct PickerState {
    pub periods: Vec<Period>,
    pub selected: usize,
}

impl PickerState {
    fn around(current: Period) -> Self {
        let periods = Period::selectable_around(current.year());
        let selected = periods.iter().position(|p| *p == current).unwrap_or(0);
        Self { periods, selected }
    }

    fn select_next(&mut self) {
        if !self.periods.is_empty() {
            self.selected = (self.selected + 1).min(self.periods.len() - 1);
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn current(&self) -> Option<Period> {
        self.periods.get(self.selected).copied()
    }
}

#[derive(Debug)]
pub struct UiState {
    pub focus: Focus,
    pub form: FormState,
    pub selected: usize,
    pub picker: Option<PickerState>,
    pub show_summary: bool,
    pub toast: Option<ToastState>,
    pub currency_symbol: String,
}

impl UiState {
    pub fn new(currency_symbol: String) -> Self {
        Self {
            focus: Focus::Description,
            form: FormState::default(),
            selected: 0,
            picker: None,
            show_summary: false,
            toast: None,
            currency_symbol,
        }
    }

    fn show_toast(&mut self, message: impl Into<String>, level: ToastLevel) {
        self.toast = Some(ToastState {
            message: message.into(),
            level,
            shown_at: Instant::now(),
        });
    }

    fn expire_toast(&mut self, now: Instant) {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| now.duration_since(toast.shown_at) >= TOAST_TTL)
        {
            self.toast = None;
        }
    }
}

pub struct App<G = HttpGateway> {
    sync: Synchronizer<G>,
    pub state: UiState,
    probe_interval: Duration,
    should_quit: bool,
}

impl App<HttpGateway> {
    pub fn new(config: AppConfig) -> Result<Self> {
        let gateway = HttpGateway::new(config.gateway()?)?;
        let book = ExpenseBook::new(config.allowance()?, Period::current());
        Ok(Self::with_gateway(
            gateway,
            book,
            config.probe_interval()?,
            config.currency_symbol,
        ))
    }
}

impl<G: ExpenseGateway> App<G> {
    pub fn with_gateway(
        gateway: G,
        book: ExpenseBook,
        probe_interval: Duration,
        currency_symbol: String,
    ) -> Self {
        Self {
            sync: Synchronizer::new(gateway, book),
            state: UiState::new(currency_symbol),
            probe_interval,
            should_quit: false,
        }
    }

    pub fn book(&self) -> &ExpenseBook {
        self.sync.book()
    }

    /// Loads the current month and starts probing.
    pub fn start(&mut self) {
        let period = self.sync.book().period();
        self.sync.select_period(period);
        self.sync.refresh_active_periods();
        self.sync.start_probing(self.probe_interval);
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        self.start();
        let result = self.event_loop(&mut terminal);
        self.sync.stop_probing();
        ui::restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut ui::Terminal) -> Result<()> {
        let tick_rate = Duration::from_millis(200);

        while !self.should_quit {
            self.apply_outcomes();
            self.state.expire_toast(Instant::now());

            terminal
                .draw(|frame| ui::render(frame, &self.state, self.sync.book()))
                .map_err(|err| AppError::Terminal(err.to_string()))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Folds finished gateway calls into the book and reacts to them.
    pub fn apply_outcomes(&mut self) {
        for notice in self.sync.apply_pending() {
            match notice {
                Notice::Added {
                    period,
                    description,
                } => {
                    self.state.form.clear();
                    self.state
                        .show_toast(format!("Added \"{description}\" to {period}"), ToastLevel::Success);
                    if self.state.show_summary {
                        self.sync.request_summary();
                    }
                }
                Notice::Removed { .. } => {
                    self.state.show_toast("Expense removed", ToastLevel::Info);
                    if self.state.show_summary {
                        self.sync.request_summary();
                    }
                }
            }
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.sync.book().expenses().len();
        self.state.selected = self.state.selected.min(len.saturating_sub(1));
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let action = map_key(key, self.state.focus.is_typing() && self.state.picker.is_none());

        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }
        if self.state.picker.is_some() {
            self.handle_picker(action);
            return;
        }

        match self.state.focus {
            Focus::Description | Focus::Amount => self.handle_form(action),
            Focus::List => self.handle_list(action),
        }
    }

    fn handle_picker(&mut self, action: AppAction) {
        let Some(picker) = self.state.picker.as_mut() else {
            return;
        };
        match action {
            AppAction::Up | AppAction::Input('k') => picker.select_prev(),
            AppAction::Down | AppAction::Input('j') => picker.select_next(),
            AppAction::Submit => {
                let chosen = picker.current();
                self.state.picker = None;
                if let Some(period) = chosen {
                    self.select_period(period);
                }
            }
            AppAction::Cancel | AppAction::Input('m') => self.state.picker = None,
            _ => {}
        }
    }

    fn handle_form(&mut self, action: AppAction) {
        match action {
            AppAction::Input(ch) => self.active_field_mut().push(ch),
            AppAction::Backspace => {
                self.active_field_mut().pop();
            }
            AppAction::NextField => self.state.focus = self.state.focus.next(),
            AppAction::PrevField => self.state.focus = self.state.focus.previous(),
            AppAction::Submit => self.submit_form(),
            AppAction::Cancel => self.state.focus = Focus::List,
            _ => {}
        }
    }

    fn handle_list(&mut self, action: AppAction) {
        match action {
            AppAction::Up | AppAction::Input('k') => {
                self.state.selected = self.state.selected.saturating_sub(1);
            }
            AppAction::Down | AppAction::Input('j') => {
                self.state.selected += 1;
                self.clamp_selection();
            }
            AppAction::NextField | AppAction::Input('a') => self.state.focus = Focus::Description,
            AppAction::PrevField => self.state.focus = Focus::Amount,
            AppAction::Remove | AppAction::Input('d') => self.remove_selected(),
            AppAction::Input('[') => self.select_period(self.sync.book().period().previous()),
            AppAction::Input(']') => self.select_period(self.sync.book().period().next()),
            AppAction::Input('m') => {
                self.state.picker = Some(PickerState::around(self.sync.book().period()));
                self.sync.refresh_active_periods();
            }
            AppAction::Input('r') => self.sync.reload(),
            AppAction::Input('s') => {
                self.state.show_summary = !self.state.show_summary;
                if self.state.show_summary {
                    self.sync.request_summary();
                }
            }
            AppAction::Input('x') | AppAction::Cancel => self.sync.dismiss_error(),
            _ => {}
        }
    }

    fn active_field_mut(&mut self) -> &mut String {
        match self.state.focus {
            Focus::Amount => &mut self.state.form.amount,
            Focus::Description | Focus::List => &mut self.state.form.description,
        }
    }

    fn submit_form(&mut self) {
        let form = &self.state.form;
        // Refusals are recorded in the book and shown in the error banner.
        if let Err(err) = self.sync.add_expense(&form.description, &form.amount) {
            tracing::debug!("add refused: {err}");
        }
    }

    fn remove_selected(&mut self) {
        let Some(id) = self
            .sync
            .book()
            .expenses()
            .get(self.state.selected)
            .map(|expense| expense.id)
        else {
            return;
        };
        if let Err(err) = self.sync.remove_expense(id) {
            tracing::debug!("remove refused: {err}");
        }
    }

    fn select_period(&mut self, period: Period) {
        self.state.selected = 0;
        self.sync.select_period(period);
        if self.state.show_summary {
            self.sync.request_summary();
        }
    }

    #[cfg(test)]
    async fn settle(&mut self) {
        tokio::time::sleep(Duration::from_millis(1)).await;
        self.apply_outcomes();
    }
}
