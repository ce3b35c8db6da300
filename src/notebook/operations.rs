//! Error notebook operations.
//!
//! Everything here works on the `error_notebook` / `error_archive` lists of a
//! caller-owned `State`; nothing is persisted. Entries can be addressed by
//! list index (stale indices are ignored) or by their stable id.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use rand::Rng;
use serde_json::json;
use uuid::Uuid;

use super::models::*;
use crate::state::{EventSink, State};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Record a wrong answer dated today. Returns the new entry's id.
pub fn add(state: &mut State, error: NewError) -> Uuid {
    add_on(state, error, today())
}

/// Record a wrong answer dated `today`.
///
/// If the notebook then holds more than `MAX_NOTEBOOK_SIZE` entries, the
/// oldest one (first among equal dates) moves to the archive tagged
/// `notebook_full`.
pub fn add_on(state: &mut State, error: NewError, today: NaiveDate) -> Uuid {
    let entry = error.into_entry(today);
    let id = entry.id;
    state.error_notebook.push(entry);

    while state.error_notebook.len() > MAX_NOTEBOOK_SIZE {
        let oldest = state
            .error_notebook
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.date.cmp(&b.date))
            .map(|(index, _)| index)
            .unwrap_or(0);

        let mut evicted = state.error_notebook.remove(oldest);
        evicted.archived_at = Some(today);
        evicted.archived_reason = Some(ArchiveReason::NotebookFull);
        log::info!("Error notebook full, archived entry from {}", evicted.date);
        state.error_archive.push(evicted);
    }

    id
}

/// Page through the notebook, newest first, or draw random entries.
pub fn page(state: &State, query: &PageQuery) -> ErrorPage {
    page_with_rng(state, query, &mut rand::thread_rng())
}

pub fn page_with_rng<R: Rng + ?Sized>(state: &State, query: &PageQuery, rng: &mut R) -> ErrorPage {
    let mut errors: Vec<&ErrorEntry> = state.error_notebook.iter().collect();
    errors.sort_by(|a, b| b.date.cmp(&a.date));

    if let Some(month) = query.month.as_deref() {
        errors.retain(|e| e.date.starts_with(month));
    }

    let total = errors.len();

    if let Some(count) = query.random.filter(|&n| n > 0) {
        let selected_count = count.min(total);
        let selected = rand::seq::index::sample(rng, total, selected_count)
            .into_iter()
            .map(|i| errors[i].clone())
            .collect();

        return ErrorPage {
            total,
            page: 1,
            per_page: selected_count,
            total_pages: 1,
            has_more: total > selected_count,
            has_prev: false,
            mode: PageMode::Random,
            errors: selected,
        };
    }

    let per_page = query.per_page;
    let total_pages = if per_page > 0 {
        total.div_ceil(per_page)
    } else {
        1
    };
    let page = if total_pages > 0 {
        query.page.clamp(1, total_pages)
    } else {
        1
    };

    let start = ((page - 1) * per_page).min(total);
    let end = (start + per_page).min(total);

    ErrorPage {
        total,
        page,
        per_page,
        total_pages,
        has_more: page < total_pages,
        has_prev: page > 1,
        mode: PageMode::Paginated,
        errors: errors[start..end].iter().map(|e| (*e).clone()).collect(),
    }
}

/// Counts of reviewed/unreviewed entries and entries per month
pub fn stats(state: &State) -> ErrorStats {
    let errors = &state.error_notebook;
    let reviewed = errors.iter().filter(|e| e.reviewed).count();

    let mut by_month: BTreeMap<String, usize> = BTreeMap::new();
    for error in errors.iter().filter(|e| !e.date.is_empty()) {
        *by_month.entry(error.month().to_string()).or_insert(0) += 1;
    }

    ErrorStats {
        total: errors.len(),
        reviewed,
        unreviewed: errors.len() - reviewed,
        by_month,
    }
}

/// Apply a review answer to the entry at `index`.
///
/// A correct answer marks the entry reviewed; a wrong one bumps its
/// `wrong_count`. An out-of-range index changes nothing and returns false.
pub fn review(state: &mut State, index: usize, correct: bool) -> bool {
    match state.error_notebook.get_mut(index) {
        Some(entry) => {
            apply_review(entry, correct);
            true
        }
        None => false,
    }
}

/// Like `review`, addressing the entry by id.
pub fn review_by_id(state: &mut State, id: Uuid, correct: bool) -> bool {
    match state.error_notebook.iter_mut().find(|e| e.id == id) {
        Some(entry) => {
            apply_review(entry, correct);
            true
        }
        None => false,
    }
}

fn apply_review(entry: &mut ErrorEntry, correct: bool) {
    if correct {
        entry.reviewed = true;
    } else {
        entry.wrong_count = entry.wrong_count.saturating_add(1);
    }
}

pub fn increment_wrong_count(state: &mut State, index: usize) -> bool {
    review(state, index, false)
}

/// Up to `count` unreviewed entries, most recent miss first
pub fn review_queue(state: &State, count: usize) -> Vec<ErrorEntry> {
    let mut unreviewed: Vec<&ErrorEntry> = state.error_notebook.iter().filter(|e| !e.reviewed).collect();
    unreviewed.sort_by(|a, b| b.date.cmp(&a.date));
    unreviewed.into_iter().take(count).cloned().collect()
}

/// Archive stale entries as of today. See `archive_stale_as_of`.
pub fn archive_stale(state: &mut State, events: Option<&dyn EventSink>) -> usize {
    archive_stale_as_of(state, today(), events)
}

/// Move unreviewed entries with `wrong_count >= 3` that are at least 30 days
/// old into the archive. Reviewed entries are never touched.
///
/// When anything moved, an `errors_archived` event is sent to `events`;
/// a failure to log is only reported in the log.
pub fn archive_stale_as_of(state: &mut State, today: NaiveDate, events: Option<&dyn EventSink>) -> usize {
    let (stale, remaining): (Vec<ErrorEntry>, Vec<ErrorEntry>) = std::mem::take(&mut state.error_notebook)
        .into_iter()
        .partition(|e| e.is_stale(today));

    state.error_notebook = remaining;
    let archived = stale.len();

    for mut entry in stale {
        entry.archived_at = Some(today);
        entry.archived_reason = Some(ArchiveReason::Stale);
        state.error_archive.push(entry);
    }

    if archived > 0 {
        log::info!("Archived {} stale errors", archived);
        if let Some(sink) = events {
            if let Err(e) = sink.append_event("errors_archived", json!({ "count": archived })) {
                log::warn!("Failed to log archival: {}", e);
            }
        }
    }

    archived
}

/// Drop reviewed entries from the active notebook. Returns how many went.
pub fn clear_reviewed(state: &mut State) -> usize {
    let before = state.error_notebook.len();
    state.error_notebook.retain(|e| !e.reviewed);
    before - state.error_notebook.len()
}
