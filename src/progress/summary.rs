//! Progress summary reported by the `stats` command

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::levels::{level_name, streak_multiplier, xp_for_next_level};
use crate::state::State;

/// Snapshot of the learner's progress, as printed by `stats`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressSummary {
    pub xp: u32,
    pub level: u8,
    pub level_name: &'static str,
    pub xp_to_next_level: u32,
    /// XP earned inside the current level
    pub level_progress: u32,
    pub streak: u32,
    pub streak_multiplier: f64,
    pub streak_freeze: u32,
    pub gems: u32,
    pub badges: BTreeSet<String>,
    pub total_quizzes: u32,
    pub correct_rate: f64,
    pub perfect_quizzes: u32,
    pub last_study_date: Option<NaiveDate>,
    pub errors_unreviewed: usize,
}

impl ProgressSummary {
    pub fn from_state(state: &State) -> Self {
        let user = &state.user;
        let (xp_to_next_level, level_progress) = xp_for_next_level(user.xp);

        Self {
            xp: user.xp,
            level: user.level,
            level_name: level_name(user.level),
            xp_to_next_level,
            level_progress,
            streak: user.streak,
            streak_multiplier: streak_multiplier(user.streak),
            streak_freeze: user.streak_freeze,
            gems: user.gems,
            badges: user.badges.clone(),
            total_quizzes: state.progress.total_quizzes,
            correct_rate: state.progress.correct_rate,
            perfect_quizzes: state.progress.perfect_quizzes,
            last_study_date: state.progress.last_study_date,
            errors_unreviewed: state.error_notebook.iter().filter(|e| !e.reviewed).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::{self, NewError};

    #[test]
    fn test_summary_for_traveler() {
        let mut state = State::default();
        state.user.xp = 550;
        state.user.level = 6;
        state.user.streak = 5;
        state.user.badges.insert("first_quiz".to_string());

        let summary = ProgressSummary::from_state(&state);

        assert_eq!(summary.level, 6);
        assert_eq!(summary.level_name, "Traveler");
        assert_eq!(summary.xp_to_next_level, 250);
        assert_eq!(summary.level_progress, 0);
        assert!((summary.streak_multiplier - 1.25).abs() < 1e-9);
        assert!(summary.badges.contains("first_quiz"));
    }

    #[test]
    fn test_summary_counts_unreviewed_errors() {
        let mut state = State::default();
        state.user.xp = 150;
        state.user.level = 3;
        notebook::add(&mut state, NewError::new("Q1", "a", "b", "c"));
        notebook::add(&mut state, NewError::new("Q2", "a", "b", "c"));
        notebook::review(&mut state, 0, true);

        let summary = ProgressSummary::from_state(&state);

        assert_eq!(summary.xp_to_next_level, 50);
        assert_eq!(summary.level_progress, 50);
        assert_eq!(summary.errors_unreviewed, 1);
    }

    #[test]
    fn test_summary_serializes_level_name() {
        let summary = ProgressSummary::from_state(&State::default());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["level_name"], "Starter");
        assert_eq!(json["last_study_date"], serde_json::Value::Null);
    }
}
