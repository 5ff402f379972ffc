//! Application state management for energydash
//!
//! This module contains the main application state: the selected day, the
//! load state of its data, and keyboard handling for moving between days.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use std::sync::Arc;
use tracing::info;

use crate::cache::Clock;
use crate::data::{DailyConsumptionClient, DayView, EARLIEST_DATE};
use crate::loader::{LoadOutcome, Loader};

/// Load state of the selected day
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Waiting for the cache or the API
    Loading,
    /// Data is available
    Loaded(Box<DayView>),
    /// The API could not be reached; the message is for logs and display
    Error(String),
}

/// Main application struct managing state and data
pub struct App {
    /// Day currently shown
    pub selected_date: NaiveDate,
    /// Load state of `selected_date`
    pub state: LoadState,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Source of "today" for date bounds
    clock: Arc<dyn Clock>,
    loader: Loader,
}

impl App {
    /// Creates the application and starts loading `initial_date`
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(client: DailyConsumptionClient, clock: Arc<dyn Clock>, initial_date: NaiveDate) -> Self {
        let mut app = Self {
            selected_date: initial_date,
            state: LoadState::Loading,
            should_quit: false,
            show_help: false,
            clock,
            loader: Loader::new(client),
        };
        app.select_date(initial_date);
        app
    }

    /// Latest selectable day
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Selects `date`, clamped to the available range, and starts loading it
    pub fn select_date(&mut self, date: NaiveDate) {
        let date = date.clamp(EARLIEST_DATE, self.today().max(EARLIEST_DATE));
        self.selected_date = date;
        self.state = LoadState::Loading;
        self.loader.request(date);
    }

    /// Loads the selected day again
    pub fn retry(&mut self) {
        info!(date = %self.selected_date, "reloading");
        self.select_date(self.selected_date);
    }

    pub fn previous_day(&mut self) {
        if let Some(date) = self.selected_date.pred_opt() {
            if date >= EARLIEST_DATE {
                self.select_date(date);
            }
        }
    }

    pub fn next_day(&mut self) {
        if let Some(date) = self.selected_date.succ_opt() {
            if date <= self.today() {
                self.select_date(date);
            }
        }
    }

    /// Applies a finished load, if one is waiting
    pub fn poll_loader(&mut self) {
        if let Some(outcome) = self.loader.try_recv() {
            self.apply(outcome);
        }
    }

    /// Waits for the current load to finish and applies it
    pub async fn wait_for_load(&mut self) {
        if let Some(outcome) = self.loader.next().await {
            self.apply(outcome);
        }
    }

    fn apply(&mut self, outcome: LoadOutcome) {
        // The loader only hands out the latest request, which is always for
        // the selected date
        self.state = match outcome.result {
            Ok(view) => LoadState::Loaded(Box::new(view)),
            Err(e) => LoadState::Error(e.to_string()),
        };
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application
    /// - `Left`/`h`: Previous day
    /// - `Right`/`l`: Next day (not past today)
    /// - `t`: Jump to today
    /// - `r`: Reload the selected day
    /// - `?`: Toggle help overlay
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {} // Ignore other keys when help is shown
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.previous_day();
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.next_day();
            }
            KeyCode::Char('t') => {
                let today = self.today();
                if self.selected_date != today {
                    self.select_date(today);
                }
            }
            KeyCode::Char('r') => {
                self.retry();
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }
}
