use anyhow::{bail, Context, Result};
use serde_json::json;

use eng_tutor_lib::progress::{self, Quiz, UserAnswers};
use eng_tutor_lib::state::DailyContent;

use crate::app::App;

pub fn run(app: &App, date: Option<&str>) -> Result<()> {
    let quiz_day = App::parse_date(date)?.unwrap_or_else(App::today);
    let today = App::today();

    let quiz = match app.store.load_daily_content(DailyContent::Quiz, Some(quiz_day)) {
        Some(value) => serde_json::from_value::<Quiz>(value).context("Malformed quiz")?,
        None => bail!("No quiz found for {}", quiz_day),
    };
    let answers = match app.store.load_daily_content(DailyContent::UserAnswers, Some(quiz_day)) {
        Some(value) => UserAnswers::from_value(value).context("Malformed answers")?,
        None => bail!("No answers found for {}", quiz_day),
    };

    let mut state = app.load();
    if !state.can_take_quiz(today) {
        bail!("Quiz already completed today");
    }

    let result = progress::evaluate(&quiz, &answers, state.user.streak, today);
    progress::apply(&mut state, &result);
    state.mark_quiz_completed(today);
    app.save(&state)?;

    app.record_event(
        "quiz_completed",
        json!({
            "quiz_date": result.quiz_date,
            "accuracy": result.accuracy,
            "xp_earned": result.total_xp_earned,
            "errors": result.wrong_count,
        }),
    );

    App::print_json(&result)
}
