//! Quiz grading
//!
//! `evaluate` is pure: it compares answers and computes XP. `apply` folds a
//! result into the state document, including recording each miss in the
//! error notebook.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::levels::{calculate_level, streak_multiplier};
use crate::notebook::{self, NewError};
use crate::state::State;

/// Bonus for getting every question right
pub const PERFECT_QUIZ_BONUS: u32 = 20;

const DEFAULT_PASSING_SCORE: f64 = 70.0;

/// Base XP for a correct answer, by question type
pub fn base_xp(question_type: &str) -> u32 {
    match question_type {
        "fill_blank" => 12,
        "dialogue_completion" | "chinglish_fix" => 15,
        _ => 10,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub quiz_date: String,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    /// Accuracy percentage needed to pass
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_passing_score() -> f64 {
    DEFAULT_PASSING_SCORE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Number or string; matched against answer keys as text
    #[serde(default)]
    pub id: Value,
    #[serde(rename = "type", default = "default_question_type")]
    pub question_type: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub correct_answer: Value,
    #[serde(default)]
    pub explanation: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_question_type() -> String {
    "multiple_choice".to_string()
}

impl QuizQuestion {
    pub fn key(&self) -> String {
        value_text(&self.id)
    }
}

/// A user's answers keyed by question id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAnswers {
    #[serde(default)]
    pub quiz_date: Option<String>,
    #[serde(default)]
    pub answers: BTreeMap<String, Value>,
}

impl UserAnswers {
    /// Accepts `{"answers": {...}}` or a bare `{"1": "B", ...}` map
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        match value {
            Value::Object(map) if !map.contains_key("answers") => Ok(Self {
                quiz_date: None,
                answers: map.into_iter().collect(),
            }),
            other => serde_json::from_value(other),
        }
    }

    pub fn answer(&self, key: &str) -> String {
        self.answers.get(key).map(value_text).unwrap_or_default().trim().to_string()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Per-question outcome
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnswerDetail {
    pub question_id: String,
    pub question_type: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub base_xp: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResult {
    /// Day the quiz was graded
    pub date: NaiveDate,
    pub quiz_date: String,
    pub total_questions: usize,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub base_xp: u32,
    pub streak_multiplier: f64,
    pub bonus_xp: u32,
    pub total_xp_earned: u32,
    /// Percent, one decimal
    pub accuracy: f64,
    pub passed: bool,
    pub details: Vec<AnswerDetail>,
    pub errors: Vec<NewError>,
}

impl QuizResult {
    pub fn is_perfect(&self) -> bool {
        self.total_questions > 0 && self.correct_count == self.total_questions
    }
}

/// Answers match when equal after trimming, ignoring case
pub fn check_answer(question: &QuizQuestion, user_answer: &str) -> bool {
    let correct = value_text(&question.correct_answer);
    user_answer.trim().to_lowercase() == correct.trim().to_lowercase()
}

/// Grade `answers` against `quiz` for a user on a `streak`-day streak
pub fn evaluate(quiz: &Quiz, answers: &UserAnswers, streak: u32, today: NaiveDate) -> QuizResult {
    let mut details = Vec::with_capacity(quiz.questions.len());
    let mut errors = Vec::new();
    let mut total_base_xp = 0;

    for question in &quiz.questions {
        let key = question.key();
        let user_answer = answers.answer(&key);
        let is_correct = check_answer(question, &user_answer);
        let xp = base_xp(&question.question_type);

        if is_correct {
            total_base_xp += xp;
        } else {
            errors.push(NewError {
                question_type: Some(question.question_type.clone()),
                keypoint_date: Some(quiz.quiz_date.clone()).filter(|d| !d.is_empty()),
                ..NewError::new(
                    question.question.clone(),
                    user_answer.clone(),
                    value_text(&question.correct_answer),
                    question.explanation.clone(),
                )
            });
        }

        details.push(AnswerDetail {
            question_id: key,
            question_type: question.question_type.clone(),
            user_answer,
            correct_answer: value_text(&question.correct_answer),
            is_correct,
            base_xp: if is_correct { xp } else { 0 },
        });
    }

    let total_questions = quiz.questions.len();
    let correct_count = total_questions - errors.len();
    let accuracy = if total_questions > 0 {
        correct_count as f64 / total_questions as f64 * 100.0
    } else {
        0.0
    };

    let multiplier = streak_multiplier(streak);
    let perfect = total_questions > 0 && correct_count == total_questions;
    let bonus_xp = if perfect { PERFECT_QUIZ_BONUS } else { 0 };
    let total_xp_earned = (f64::from(total_base_xp) * multiplier) as u32 + bonus_xp;

    QuizResult {
        date: today,
        quiz_date: quiz.quiz_date.clone(),
        total_questions,
        correct_count,
        wrong_count: total_questions - correct_count,
        base_xp: total_base_xp,
        streak_multiplier: multiplier,
        bonus_xp,
        total_xp_earned,
        accuracy: round1(accuracy),
        passed: accuracy >= quiz.passing_score,
        details,
        errors,
    }
}

/// Fold a graded quiz into the state: XP and level, progress counters and
/// one notebook entry per wrong answer.
pub fn apply(state: &mut State, result: &QuizResult) {
    state.user.xp = state.user.xp.saturating_add(result.total_xp_earned);
    state.user.level = calculate_level(state.user.xp);

    let progress = &mut state.progress;
    let old_total = progress.total_quizzes;
    let new_total = old_total + 1;
    let rate = (progress.correct_rate * f64::from(old_total) + result.accuracy) / f64::from(new_total);

    progress.total_quizzes = new_total;
    progress.correct_rate = round1(rate);
    progress.last_study_date = Some(result.date);
    if result.is_perfect() {
        progress.perfect_quizzes += 1;
    }

    for error in &result.errors {
        notebook::add_on(state, error.clone(), result.date);
    }
}
