use anyhow::Result;
use chrono::Local;

use crate::app::App;

pub fn run(app: &App, date: Option<&str>) -> Result<()> {
    let date = App::parse_date(date)?.unwrap_or_else(App::today);

    let mut state = app.load();
    state.record_keypoint_view(date, Local::now().naive_local());
    app.save(&state)?;

    println!("View recorded successfully");
    Ok(())
}
