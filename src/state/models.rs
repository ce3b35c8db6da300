//! Typed sections of the state document

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::notebook::ErrorEntry;

/// Schema tag written into every state file
pub const STATE_VERSION: u32 = 2;

/// Keypoint view records kept in `completion_status`
pub const MAX_VIEW_HISTORY: usize = 30;

/// Topic fingerprints kept in `recent_topics`
pub const MAX_RECENT_TOPICS: usize = 50;

/// Onboarding step at which the user counts as initialized
pub const ONBOARDING_COMPLETE: u8 = 6;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid CEFR level '{0}'. Must be A1, A2, B1, B2, C1, or C2")]
    CefrLevel(String),

    #[error("Invalid style '{0}'. Must be humorous, rigorous, casual, or professional")]
    TutorStyle(String),

    #[error("Invalid time '{0}'. Use HH:MM")]
    Time(String),

    #[error("Quiz time must be later than keypoint time")]
    QuizBeforeKeypoint,

    #[error("Oral ratio must be between 0 and 100")]
    OralRatio(i64),
}

/// Language proficiency tier (not the XP-driven activity level)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Default for CefrLevel {
    fn default() -> Self {
        Self::B1
    }
}

impl FromStr for CefrLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            "C2" => Ok(Self::C2),
            other => Err(ValidationError::CefrLevel(other.to_string())),
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        };
        f.write_str(s)
    }
}

/// Tone used by the content generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TutorStyle {
    #[default]
    Humorous,
    Rigorous,
    Casual,
    Professional,
}

impl FromStr for TutorStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "humorous" => Ok(Self::Humorous),
            "rigorous" => Ok(Self::Rigorous),
            "casual" => Ok(Self::Casual),
            "professional" => Ok(Self::Professional),
            other => Err(ValidationError::TutorStyle(other.to_string())),
        }
    }
}

impl fmt::Display for TutorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Humorous => "humorous",
            Self::Rigorous => "rigorous",
            Self::Casual => "casual",
            Self::Professional => "professional",
        };
        f.write_str(s)
    }
}

/// A single keypoint view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeypointView {
    pub date: NaiveDate,
    pub viewed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CompletionStatus {
    pub quiz_completed_date: Option<NaiveDate>,
    /// Oldest first, capped at `MAX_VIEW_HISTORY`
    pub keypoint_view_history: Vec<KeypointView>,
}

/// Daily push times. Quiz time must be later than keypoint time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub keypoint_time: String,
    pub quiz_time: String,
    pub timezone: String,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            keypoint_time: "06:45".to_string(),
            quiz_time: "22:45".to_string(),
            timezone: "Asia/Shanghai".to_string(),
        }
    }
}

/// Parse an `HH:MM` clock time
pub fn parse_clock(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ValidationError::Time(value.to_string()))
}

impl Schedule {
    /// Apply the given changes, keeping the current value for anything `None`.
    ///
    /// Nothing is modified unless the resulting quiz time is strictly later
    /// than the keypoint time.
    pub fn update(
        &mut self,
        keypoint_time: Option<&str>,
        quiz_time: Option<&str>,
        timezone: Option<&str>,
    ) -> Result<(), ValidationError> {
        let keypoint = keypoint_time.unwrap_or(self.keypoint_time.as_str());
        let quiz = quiz_time.unwrap_or(self.quiz_time.as_str());

        let keypoint_at = parse_clock(keypoint)?;
        let quiz_at = parse_clock(quiz)?;
        if quiz_at <= keypoint_at {
            return Err(ValidationError::QuizBeforeKeypoint);
        }

        self.keypoint_time = keypoint_at.format("%H:%M").to_string();
        self.quiz_time = quiz_at.format("%H:%M").to_string();
        if let Some(tz) = timezone {
            self.timezone = tz.to_string();
        }
        Ok(())
    }
}

/// Gamification counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    pub xp: u32,
    /// Activity level 1-20
    pub level: u8,
    pub streak: u32,
    pub streak_freeze: u32,
    pub gems: u32,
    pub badges: BTreeSet<String>,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            streak: 0,
            streak_freeze: 0,
            gems: 0,
            badges: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    pub cefr_level: CefrLevel,
    /// Share of oral content, 0.0-1.0
    pub oral_written_ratio: f64,
    /// Topic weights, expected to sum to about 1.0
    pub topics: BTreeMap<String, f64>,
    pub tutor_style: TutorStyle,
    /// Lookback window for topic deduplication
    pub dedup_days: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        let topics = [
            ("movies", 0.2),
            ("news", 0.15),
            ("gaming", 0.15),
            ("sports", 0.1),
            ("workplace", 0.2),
            ("social", 0.1),
            ("daily_life", 0.1),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

        Self {
            cefr_level: CefrLevel::default(),
            oral_written_ratio: 0.7,
            topics,
            tutor_style: TutorStyle::default(),
            dedup_days: 14,
        }
    }
}

impl Preferences {
    /// Oral share as a whole percentage
    pub fn oral_ratio_percent(&self) -> u8 {
        (self.oral_written_ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }

    pub fn set_oral_ratio_percent(&mut self, percent: i64) -> Result<(), ValidationError> {
        if !(0..=100).contains(&percent) {
            return Err(ValidationError::OralRatio(percent));
        }
        self.oral_written_ratio = percent as f64 / 100.0;
        Ok(())
    }
}

/// Aggregate quiz counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Progress {
    pub total_quizzes: u32,
    /// Running average accuracy, percent
    pub correct_rate: f64,
    pub last_study_date: Option<NaiveDate>,
    pub perfect_quizzes: u32,
    pub expressions_learned: u32,
}

/// The whole state document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct State {
    pub version: u32,
    pub initialized: bool,
    pub onboarding_step: u8,
    pub completion_status: CompletionStatus,
    pub schedule: Schedule,
    pub user: UserStats,
    pub preferences: Preferences,
    pub progress: Progress,
    /// Most recent last, capped at `MAX_RECENT_TOPICS`
    pub recent_topics: Vec<String>,
    pub error_notebook: Vec<ErrorEntry>,
    pub error_archive: Vec<ErrorEntry>,
    /// Top-level fields this version does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            initialized: false,
            onboarding_step: 0,
            completion_status: CompletionStatus::default(),
            schedule: Schedule::default(),
            user: UserStats::default(),
            preferences: Preferences::default(),
            progress: Progress::default(),
            recent_topics: Vec::new(),
            error_notebook: Vec::new(),
            error_archive: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl State {
    // ===== Completion tracking =====

    /// Whether today's quiz is still open
    pub fn can_take_quiz(&self, today: NaiveDate) -> bool {
        self.completion_status.quiz_completed_date != Some(today)
    }

    pub fn mark_quiz_completed(&mut self, today: NaiveDate) {
        self.completion_status.quiz_completed_date = Some(today);
    }

    /// Record that the keypoint for `date` was viewed at `viewed_at`
    pub fn record_keypoint_view(&mut self, date: NaiveDate, viewed_at: NaiveDateTime) {
        let history = &mut self.completion_status.keypoint_view_history;
        history.push(KeypointView { date, viewed_at });
        if history.len() > MAX_VIEW_HISTORY {
            let excess = history.len() - MAX_VIEW_HISTORY;
            history.drain(..excess);
        }
    }

    pub fn has_viewed_keypoint(&self, date: NaiveDate) -> bool {
        self.completion_status
            .keypoint_view_history
            .iter()
            .any(|view| view.date == date)
    }

    // ===== Onboarding =====

    pub fn update_onboarding_step(&mut self, step: i32) {
        let clamped = step.clamp(0, ONBOARDING_COMPLETE as i32) as u8;
        self.onboarding_step = clamped;
        if clamped >= ONBOARDING_COMPLETE {
            self.initialized = true;
        }
    }

    // ===== Topics =====

    /// Append a topic fingerprint, dropping the oldest past the cap
    pub fn push_recent_topic(&mut self, fingerprint: impl Into<String>) {
        self.recent_topics.push(fingerprint.into());
        if self.recent_topics.len() > MAX_RECENT_TOPICS {
            let excess = self.recent_topics.len() - MAX_RECENT_TOPICS;
            self.recent_topics.drain(..excess);
        }
    }

    /// Award a badge; returns false if it was already held
    pub fn award_badge(&mut self, badge: impl Into<String>) -> bool {
        self.user.badges.insert(badge.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_default_state_shape() {
        let state = State::default();
        assert_eq!(state.version, 2);
        assert!(!state.initialized);
        assert_eq!(state.user.level, 1);
        assert_eq!(state.preferences.cefr_level, CefrLevel::B1);
        assert_eq!(state.preferences.tutor_style, TutorStyle::Humorous);
        assert_eq!(state.schedule.keypoint_time, "06:45");
        assert_eq!(state.preferences.topics.len(), 7);

        let total: f64 = state.preferences.topics.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_serializes_snake_case() {
        let value = serde_json::to_value(State::default()).unwrap();
        assert_eq!(value["preferences"]["cefr_level"], "B1");
        assert_eq!(value["preferences"]["tutor_style"], "humorous");
        assert!(value["completion_status"]["quiz_completed_date"].is_null());
        assert!(value["user"]["badges"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_quiz_completion() {
        let mut state = State::default();
        let today = date("2026-02-20");

        assert!(state.can_take_quiz(today));
        state.mark_quiz_completed(today);
        assert!(!state.can_take_quiz(today));
        assert!(state.can_take_quiz(date("2026-02-21")));
    }

    #[test]
    fn test_view_history_capped() {
        let mut state = State::default();
        let start = date("2026-01-01");
        for i in 0..35 {
            let day = start + chrono::Duration::days(i);
            state.record_keypoint_view(day, day.and_hms_opt(8, 0, 0).unwrap());
        }

        let history = &state.completion_status.keypoint_view_history;
        assert_eq!(history.len(), MAX_VIEW_HISTORY);
        assert_eq!(history[0].date, date("2026-01-06"));
        assert!(state.has_viewed_keypoint(date("2026-02-04")));
        assert!(!state.has_viewed_keypoint(date("2026-01-01")));
    }

    #[test]
    fn test_onboarding_step_clamped() {
        let mut state = State::default();
        state.update_onboarding_step(3);
        assert_eq!(state.onboarding_step, 3);
        assert!(!state.initialized);

        state.update_onboarding_step(-2);
        assert_eq!(state.onboarding_step, 0);

        state.update_onboarding_step(9);
        assert_eq!(state.onboarding_step, 6);
        assert!(state.initialized);
    }

    #[test]
    fn test_recent_topics_capped() {
        let mut state = State::default();
        for i in 0..55 {
            state.push_recent_topic(format!("topic_{}", i));
        }
        assert_eq!(state.recent_topics.len(), MAX_RECENT_TOPICS);
        assert_eq!(state.recent_topics[0], "topic_5");
        assert_eq!(state.recent_topics.last().unwrap(), "topic_54");
    }

    #[test]
    fn test_badges_have_no_duplicates() {
        let mut state = State::default();
        assert!(state.award_badge("first_steps"));
        assert!(!state.award_badge("first_steps"));
        assert_eq!(state.user.badges.len(), 1);
    }

    #[test]
    fn test_schedule_update() {
        let mut schedule = Schedule::default();
        schedule.update(Some("07:30"), None, Some("Europe/Berlin")).unwrap();
        assert_eq!(schedule.keypoint_time, "07:30");
        assert_eq!(schedule.quiz_time, "22:45");
        assert_eq!(schedule.timezone, "Europe/Berlin");
    }

    #[test]
    fn test_schedule_rejects_quiz_before_keypoint() {
        let mut schedule = Schedule::default();
        let err = schedule.update(Some("23:00"), None, None).unwrap_err();
        assert_eq!(err, ValidationError::QuizBeforeKeypoint);
        assert_eq!(schedule.keypoint_time, "06:45");

        let err = schedule.update(None, Some("06:45"), None).unwrap_err();
        assert_eq!(err, ValidationError::QuizBeforeKeypoint);
    }

    #[test]
    fn test_schedule_rejects_bad_time() {
        let mut schedule = Schedule::default();
        assert!(matches!(
            schedule.update(Some("7am"), None, None),
            Err(ValidationError::Time(_))
        ));
        assert!(matches!(
            schedule.update(None, Some("25:00"), None),
            Err(ValidationError::Time(_))
        ));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("C1".parse::<CefrLevel>().unwrap(), CefrLevel::C1);
        assert!("D1".parse::<CefrLevel>().is_err());
        assert_eq!("casual".parse::<TutorStyle>().unwrap(), TutorStyle::Casual);
        assert!("grumpy".parse::<TutorStyle>().is_err());
        assert_eq!(CefrLevel::A2.to_string(), "A2");
    }

    #[test]
    fn test_oral_ratio_percent() {
        let mut preferences = Preferences::default();
        assert_eq!(preferences.oral_ratio_percent(), 70);

        preferences.set_oral_ratio_percent(55).unwrap();
        assert_eq!(preferences.oral_ratio_percent(), 55);

        assert_eq!(preferences.set_oral_ratio_percent(101), Err(ValidationError::OralRatio(101)));
        assert!(preferences.set_oral_ratio_percent(-1).is_err());
        assert_eq!(preferences.oral_ratio_percent(), 55);
    }
}
