use anyhow::Result;

use crate::app::App;

pub fn run(app: &App, keypoint_time: Option<&str>, quiz_time: Option<&str>, timezone: Option<&str>) -> Result<()> {
    let mut state = app.load();

    if keypoint_time.is_none() && quiz_time.is_none() && timezone.is_none() {
        return App::print_json(&state.schedule);
    }

    state.schedule.update(keypoint_time, quiz_time, timezone)?;
    app.save(&state)?;

    println!(
        "Schedule updated: keypoint at {}, quiz at {}",
        state.schedule.keypoint_time, state.schedule.quiz_time
    );
    Ok(())
}
