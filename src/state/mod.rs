//! State document persistence
//!
//! One JSON document per installation, written atomically, plus the
//! month-keyed event log and per-day content directories.

pub mod events;
pub mod merge;
pub mod migration;
mod models;
mod store;

pub use events::{EventRecord, EventSink};
pub use models::*;
pub use store::{DailyContent, LoadedState, StateSource, StateStore, StorageError, STATE_DIR_ENV};
