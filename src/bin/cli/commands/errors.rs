use anyhow::{bail, Result};
use serde_json::json;
use uuid::Uuid;

use eng_tutor_lib::notebook::{self, PageQuery};
use eng_tutor_lib::state::EventSink;

use crate::app::App;

pub fn run_list(
    app: &App,
    page: usize,
    per_page: usize,
    month: Option<String>,
    random: Option<usize>,
) -> Result<()> {
    let state = app.load();
    let query = PageQuery {
        page,
        per_page,
        month,
        random,
    };
    App::print_json(&notebook::page(&state, &query))
}

pub fn run_stats(app: &App) -> Result<()> {
    App::print_json(&notebook::stats(&app.load()))
}

pub fn run_review(app: &App, count: usize) -> Result<()> {
    let errors = notebook::review_queue(&app.load(), count);
    App::print_json(&json!({
        "count": errors.len(),
        "errors": errors,
    }))
}

/// `target` is an entry id, or a position in the notebook
pub fn run_mark(app: &App, target: &str, correct: bool) -> Result<()> {
    let mut state = app.load();

    let found = if let Ok(id) = Uuid::parse_str(target) {
        notebook::review_by_id(&mut state, id, correct)
    } else if let Ok(index) = target.parse::<usize>() {
        notebook::review(&mut state, index, correct)
    } else {
        bail!("Invalid error id '{}'", target);
    };

    if !found {
        bail!("No error entry '{}'", target);
    }

    app.save(&state)?;
    if correct {
        println!("Marked as reviewed");
    } else {
        println!("Recorded another miss");
    }
    Ok(())
}

pub fn run_archive_stale(app: &App) -> Result<()> {
    let mut state = app.load();
    let archived = notebook::archive_stale(&mut state, Some(&app.store as &dyn EventSink));
    if archived > 0 {
        app.save(&state)?;
    }
    println!("Archived {} errors", archived);
    Ok(())
}

pub fn run_clear_reviewed(app: &App) -> Result<()> {
    let mut state = app.load();
    let removed = notebook::clear_reviewed(&mut state);
    if removed > 0 {
        app.save(&state)?;
    }
    println!("Removed {} reviewed errors", removed);
    Ok(())
}
