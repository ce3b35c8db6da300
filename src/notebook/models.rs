//! Data models for the error notebook

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Active entries allowed before the oldest is evicted
pub const MAX_NOTEBOOK_SIZE: usize = 100;

/// Unreviewed entries missed this many times...
pub const ARCHIVE_WRONG_THRESHOLD: u32 = 3;

/// ...and at least this old are archived by the stale sweep
pub const ARCHIVE_AGE_DAYS: i64 = 30;

/// Why an entry left the active notebook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveReason {
    /// Evicted as the oldest entry when the notebook overflowed
    NotebookFull,
    /// Missed repeatedly and never reviewed
    Stale,
}

/// One recorded wrong answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEntry {
    /// Stable identifier, assigned on insertion (or first load for older files)
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// `YYYY-MM-DD`; kept as text so malformed dates in old files still load
    #[serde(default, deserialize_with = "loose_text")]
    pub date: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub question: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub user_answer: String,
    /// Older files store the raw quiz answer, which may be a number
    #[serde(default, deserialize_with = "loose_text")]
    pub correct_answer: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub explanation: String,
    #[serde(default)]
    pub reviewed: bool,
    #[serde(default = "default_wrong_count")]
    pub wrong_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "loose_opt_text")]
    pub question_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "loose_opt_text")]
    pub keypoint_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_reason: Option<ArchiveReason>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_wrong_count() -> u32 {
    1
}

/// Text from any JSON value: null is empty, other non-strings are rendered
fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn loose_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl ErrorEntry {
    /// `YYYY-MM` part of the date
    pub fn month(&self) -> &str {
        self.date.get(..7).unwrap_or(self.date.as_str())
    }

    /// Days between the entry's date and `today`; 0 if the date is unparsable
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map(|date| (today - date).num_days())
            .unwrap_or(0)
    }

    pub fn is_stale(&self, today: NaiveDate) -> bool {
        !self.reviewed
            && self.wrong_count >= ARCHIVE_WRONG_THRESHOLD
            && self.age_days(today) >= ARCHIVE_AGE_DAYS
    }
}

/// A wrong answer about to be recorded
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewError {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub explanation: String,
    /// Defaults to 1
    #[serde(default)]
    pub wrong_count: Option<u32>,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub keypoint_date: Option<String>,
}

impl NewError {
    pub fn new(
        question: impl Into<String>,
        user_answer: impl Into<String>,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            user_answer: user_answer.into(),
            correct_answer: correct_answer.into(),
            explanation: explanation.into(),
            ..Default::default()
        }
    }

    pub(crate) fn into_entry(self, today: NaiveDate) -> ErrorEntry {
        ErrorEntry {
            id: Uuid::new_v4(),
            date: today.format("%Y-%m-%d").to_string(),
            question: self.question,
            user_answer: self.user_answer,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
            reviewed: false,
            wrong_count: self.wrong_count.unwrap_or(1).max(1),
            question_type: self.question_type,
            keypoint_date: self.keypoint_date,
            archived_at: None,
            archived_reason: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageMode {
    Paginated,
    Random,
}

/// Retrieval parameters for `page`
#[derive(Debug, Clone)]
pub struct PageQuery {
    /// 1-based, clamped into range
    pub page: usize,
    pub per_page: usize,
    /// `YYYY-MM` prefix filter
    pub month: Option<String>,
    /// Draw this many random entries instead of paginating
    pub random: Option<usize>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 5,
            month: None,
            random: None,
        }
    }
}

/// One page (or random draw) of entries
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPage {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub has_more: bool,
    pub has_prev: bool,
    pub mode: PageMode,
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ErrorStats {
    pub total: usize,
    pub reviewed: usize,
    pub unreviewed: usize,
    /// Entry counts per `YYYY-MM`, serialized newest month first
    #[serde(serialize_with = "serialize_months_desc")]
    pub by_month: BTreeMap<String, usize>,
}

fn serialize_months_desc<S>(months: &BTreeMap<String, usize>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(months.len()))?;
    for (month, count) in months.iter().rev() {
        map.serialize_entry(month, count)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_dated(date: &str) -> ErrorEntry {
        let mut entry = NewError::new("Q", "a", "b", "c").into_entry(NaiveDate::MIN);
        entry.date = date.to_string();
        entry
    }

    #[test]
    fn test_age_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(entry_dated("2026-03-01").age_days(today), 30);
        assert_eq!(entry_dated("2026-03-31").age_days(today), 0);
        assert_eq!(entry_dated("not a date").age_days(today), 0);
    }

    #[test]
    fn test_is_stale_boundaries() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let mut entry = entry_dated("2026-03-01");
        entry.wrong_count = ARCHIVE_WRONG_THRESHOLD;
        assert!(entry.is_stale(today));

        entry.date = "2026-03-02".to_string();
        assert!(!entry.is_stale(today));

        entry.date = "2026-03-01".to_string();
        entry.reviewed = true;
        assert!(!entry.is_stale(today));
    }

    #[test]
    fn test_month_of_short_date() {
        assert_eq!(entry_dated("2026-02-20").month(), "2026-02");
        assert_eq!(entry_dated("2026").month(), "2026");
    }

    #[test]
    fn test_new_error_wrong_count_at_least_one() {
        let error = NewError {
            wrong_count: Some(0),
            ..NewError::new("Q", "a", "b", "c")
        };
        assert_eq!(error.into_entry(NaiveDate::MIN).wrong_count, 1);
    }
}
