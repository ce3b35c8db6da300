//! On-disk state store
//!
//! Layout under the state directory:
//! ```text
//! state.json                          # canonical state document
//! state.json.tmp                      # write buffer, renamed over state.json
//! logs/events_YYYY-MM.jsonl           # append-only event log
//! daily/YYYY-MM-DD/<content>.json     # keypoint / quiz / user_answers
//! audio/                              # generated audio
//! backups/state_backup_*.json         # manual backups
//! ```
//!
//! Reads never fail: a missing or unreadable state file yields the default
//! document. Writes always report failure to the caller.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Duration, Local, NaiveDate};
use serde_json::Value;
use thiserror::Error;

use super::events::{self, EventRecord, EventSink};
use super::merge::merge_onto_defaults;
use super::migration::{migrate_legacy_dir, MigrationOutcome};
use super::models::State;

/// Environment variable overriding the default state directory
pub const STATE_DIR_ENV: &str = "ENG_TUTOR_STATE_DIR";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Kinds of per-day generated content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyContent {
    Keypoint,
    Quiz,
    UserAnswers,
}

impl DailyContent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keypoint => "keypoint",
            Self::Quiz => "quiz",
            Self::UserAnswers => "user_answers",
        }
    }

    fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl FromStr for DailyContent {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "keypoint" => Ok(Self::Keypoint),
            "quiz" => Ok(Self::Quiz),
            "user_answers" => Ok(Self::UserAnswers),
            other => Err(StorageError::InvalidOperation(format!(
                "Unknown content type '{}'. Must be keypoint, quiz, or user_answers",
                other
            ))),
        }
    }
}

impl fmt::Display for DailyContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a loaded state came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
    /// Read from disk and merged onto defaults
    File,
    /// No state file yet
    Missing,
    /// State file could not be read or decoded; defaults used
    Corrupt,
}

#[derive(Debug, Clone)]
pub struct LoadedState {
    pub state: State,
    pub source: StateSource,
}

impl LoadedState {
    pub fn used_defaults(&self) -> bool {
        self.source != StateSource::File
    }
}

pub struct StateStore {
    state_dir: PathBuf,
}

impl StateStore {
    /// Resolve the default state directory: `$ENG_TUTOR_STATE_DIR`, else the
    /// platform's local data directory.
    pub fn default_state_dir() -> Result<PathBuf> {
        if let Some(dir) = state_dir_override() {
            return Ok(dir);
        }
        dirs::data_local_dir()
            .map(|p| p.join("eng-tutor"))
            .ok_or(StorageError::DataDirNotFound)
    }

    /// Pre-XDG location used by older installs
    pub fn legacy_state_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".eng-tutor"))
    }

    /// Open a store rooted at `state_dir`, creating its directories.
    pub fn open(state_dir: PathBuf) -> Result<Self> {
        let store = Self { state_dir };
        store.ensure_directories()?;
        Ok(store)
    }

    /// Open a store, first moving data over from `legacy_dir` if this is a
    /// fresh state directory. A failed migration is logged and recorded as a
    /// `migration_failed` event; the store still opens.
    pub fn open_with_legacy(state_dir: PathBuf, legacy_dir: &Path) -> Result<Self> {
        let migration = migrate_legacy_dir(legacy_dir, &state_dir);
        let store = Self::open(state_dir)?;

        match migration {
            Ok(MigrationOutcome::Migrated { backup_dir }) => {
                log::info!("Legacy data migrated, backup at {:?}", backup_dir);
            }
            Ok(MigrationOutcome::Skipped) => {}
            Err(e) => {
                log::warn!("Migration failed: {}. Using new state directory.", e);
                let data = serde_json::json!({
                    "error": e.to_string(),
                    "source_dir": legacy_dir.to_string_lossy(),
                    "target_dir": store.state_dir.to_string_lossy(),
                });
                if let Err(log_err) = store.append_event("migration_failed", data) {
                    log::warn!("Could not record migration failure: {}", log_err);
                }
            }
        }

        Ok(store)
    }

    /// Open the default store, migrating legacy data only when the default
    /// directory is in use.
    pub fn open_default() -> Result<Self> {
        let state_dir = Self::default_state_dir()?;
        match Self::legacy_state_dir() {
            Some(legacy) if state_dir_override().is_none() => {
                Self::open_with_legacy(state_dir, &legacy)
            }
            _ => Self::open(state_dir),
        }
    }

    // ===== Paths =====

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join("state.json")
    }

    fn temp_file(&self) -> PathBuf {
        self.state_dir.join("state.json.tmp")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    pub fn daily_root(&self) -> PathBuf {
        self.state_dir.join("daily")
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.state_dir.join("audio")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.state_dir.join("backups")
    }

    fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.state_dir)?;
        fs::create_dir_all(self.logs_dir())?;
        fs::create_dir_all(self.daily_root())?;
        fs::create_dir_all(self.audio_dir())?;
        Ok(())
    }

    // ===== State document =====

    /// Load the state, falling back to defaults on any read problem.
    pub fn load(&self) -> State {
        self.load_tracked().state
    }

    /// Load the state and report whether defaults were used.
    pub fn load_tracked(&self) -> LoadedState {
        let path = self.state_file();
        if !path.exists() {
            return LoadedState {
                state: State::default(),
                source: StateSource::Missing,
            };
        }

        match read_state_file(&path) {
            Ok(state) => LoadedState {
                state,
                source: StateSource::File,
            },
            Err(e) => {
                log::warn!("Error loading state from {:?}: {}. Using defaults.", path, e);
                LoadedState {
                    state: State::default(),
                    source: StateSource::Corrupt,
                }
            }
        }
    }

    /// Persist the state atomically: write a temp file, then rename it over
    /// `state.json`. The temp file is removed if anything fails.
    pub fn save(&self, state: &State) -> Result<()> {
        self.ensure_directories()?;

        let json = serde_json::to_string_pretty(state)?;
        let temp = self.temp_file();

        if let Err(e) = write_then_rename(&temp, &self.state_file(), json.as_bytes()) {
            log::error!("Error saving state: {}", e);
            if temp.exists() {
                let _ = fs::remove_file(&temp);
            }
            return Err(e.into());
        }
        Ok(())
    }

    // ===== Backups =====

    /// Write a timestamped copy of the current state into `dir`
    /// (default `backups/`).
    pub fn backup(&self, dir: Option<&Path>) -> Result<PathBuf> {
        let backup_dir = dir.map(Path::to_path_buf).unwrap_or_else(|| self.backups_dir());
        fs::create_dir_all(&backup_dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let backup_file = backup_dir.join(format!("state_backup_{}.json", timestamp));

        let state = self.load();
        fs::write(&backup_file, serde_json::to_string_pretty(&state)?)?;

        log::info!("State backed up to {:?}", backup_file);
        Ok(backup_file)
    }

    /// Replace the current state with the contents of a backup file.
    pub fn restore(&self, backup_file: &Path) -> Result<State> {
        let state = read_state_file(backup_file)?;
        self.save(&state)?;
        Ok(state)
    }

    // ===== Daily content =====

    /// Directory for a given day (not created)
    pub fn daily_dir(&self, date: NaiveDate) -> PathBuf {
        self.daily_root().join(date.format("%Y-%m-%d").to_string())
    }

    /// Today's directory, created if missing
    pub fn today_dir(&self) -> Result<PathBuf> {
        let dir = self.daily_dir(Local::now().date_naive());
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Write a content file for `date` (default today) and return its path.
    pub fn save_daily_content(
        &self,
        kind: DailyContent,
        content: &Value,
        date: Option<NaiveDate>,
    ) -> Result<PathBuf> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let dir = self.daily_dir(date);
        fs::create_dir_all(&dir)?;

        let path = dir.join(kind.file_name());
        fs::write(&path, serde_json::to_string_pretty(content)?)?;
        Ok(path)
    }

    /// Read a content file for `date` (default today). Missing files give `None`.
    pub fn load_daily_content(&self, kind: DailyContent, date: Option<NaiveDate>) -> Option<Value> {
        let date = date.unwrap_or_else(|| Local::now().date_naive());
        let path = self.daily_dir(date).join(kind.file_name());
        if !path.exists() {
            return None;
        }

        let parsed = fs::read_to_string(&path)
            .map_err(StorageError::from)
            .and_then(|content| serde_json::from_str(&content).map_err(StorageError::from));

        match parsed {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Error loading {} for {}: {}", kind, date, e);
                None
            }
        }
    }

    /// Keypoints from the last `days` days, newest first
    pub fn recent_daily_content(&self, days: u32) -> Vec<Value> {
        let today = Local::now().date_naive();
        (0..days as i64)
            .filter_map(|offset| {
                self.load_daily_content(DailyContent::Keypoint, Some(today - Duration::days(offset)))
            })
            .collect()
    }

    /// Topic fingerprints of recent keypoints, for deduplication
    pub fn recent_topics(&self, days: u32) -> Vec<String> {
        self.recent_daily_content(days)
            .iter()
            .filter_map(|content| content.get("topic_fingerprint")?.as_str())
            .filter(|fingerprint| !fingerprint.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl EventSink for StateStore {
    fn append_event(&self, event_type: &str, data: Value) -> Result<()> {
        let logs_dir = self.logs_dir();
        fs::create_dir_all(&logs_dir)?;

        let now = Local::now();
        let record = EventRecord {
            timestamp: now.naive_local(),
            event_type: event_type.to_string(),
            data,
        };
        events::append_entry(&events::log_path(&logs_dir, now.date_naive()), &record)?;
        Ok(())
    }
}

/// `$ENG_TUTOR_STATE_DIR`, unless unset or blank
fn state_dir_override() -> Option<PathBuf> {
    dir_from_env_value(std::env::var(STATE_DIR_ENV).ok().as_deref())
}

fn dir_from_env_value(value: Option<&str>) -> Option<PathBuf> {
    value.filter(|dir| !dir.trim().is_empty()).map(PathBuf::from)
}

fn read_state_file(path: &Path) -> Result<State> {
    let content = fs::read_to_string(path)?;
    let loaded: Value = serde_json::from_str(&content)?;
    Ok(merge_onto_defaults(loaded)?)
}

fn write_then_rename(temp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp, target)
}
