use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use eng_tutor_lib::state::{EventSink, State, StateStore};

/// Shared application state for CLI commands
pub struct App {
    pub store: StateStore,
}

impl App {
    /// Open the store at `state_dir`, or the default location
    pub fn new(state_dir: Option<PathBuf>) -> Result<Self> {
        let store = match state_dir {
            Some(dir) => StateStore::open(dir.clone())
                .with_context(|| format!("Failed to open state directory {}", dir.display()))?,
            None => StateStore::open_default().context("Failed to open state directory")?,
        };
        Ok(Self { store })
    }

    pub fn load(&self) -> State {
        self.store.load()
    }

    pub fn save(&self, state: &State) -> Result<()> {
        self.store.save(state).context("Failed to save state")
    }

    /// Log an event; the command still succeeds if logging fails
    pub fn record_event(&self, event_type: &str, data: serde_json::Value) {
        if let Err(e) = self.store.append_event(event_type, data) {
            log::warn!("Failed to log {} event: {}", event_type, e);
        }
    }

    /// Parse an optional `YYYY-MM-DD` argument
    pub fn parse_date(date: Option<&str>) -> Result<Option<NaiveDate>> {
        match date {
            None => Ok(None),
            Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                Ok(date) => Ok(Some(date)),
                Err(_) => bail!("Invalid date format. Use YYYY-MM-DD"),
            },
        }
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
