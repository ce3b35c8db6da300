//! State core for a daily English tutor: the persisted state document, the
//! error notebook of wrong answers, and XP/level progress.

pub mod notebook;
pub mod progress;
pub mod state;
