//! Append-only event log.
//!
//! One JSONL file per calendar month (`logs/events_YYYY-MM.jsonl`). Each line
//! is `{timestamp, type, data}`. The log is an audit trail; nothing in the
//! library reads it back.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::store::StorageError;

/// A single log line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub timestamp: NaiveDateTime,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

/// Anything that accepts audit events
pub trait EventSink {
    fn append_event(&self, event_type: &str, data: Value) -> Result<(), StorageError>;
}

/// Log file for the month containing `day`
pub fn log_path(logs_dir: &Path, day: NaiveDate) -> PathBuf {
    logs_dir.join(format!("events_{}.jsonl", day.format("%Y-%m")))
}

/// Append one record to a log file, creating it if needed.
pub fn append_entry(path: &Path, entry: &EventRecord) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let json = serde_json::to_string(entry)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    writeln!(file, "{}", json)?;

    Ok(())
}

/// Read all records of a log file in write order. Unparsable lines are skipped.
pub fn read_entries(path: &Path) -> Vec<EventRecord> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };

    BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            serde_json::from_str::<EventRecord>(trimmed).ok()
        })
        .collect()
}
