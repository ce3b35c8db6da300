//! XP, activity levels and quiz grading

pub mod levels;
mod scorer;
mod summary;

pub use levels::{calculate_level, level_name, streak_multiplier, xp_for_next_level};
pub use scorer::*;
pub use summary::ProgressSummary;
