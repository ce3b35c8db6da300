use anyhow::Result;

use eng_tutor_lib::progress::ProgressSummary;

use crate::app::App;

pub fn run(app: &App) -> Result<()> {
    let state = app.load();
    App::print_json(&ProgressSummary::from_state(&state))
}
