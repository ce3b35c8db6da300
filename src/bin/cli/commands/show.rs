use anyhow::Result;

use crate::app::App;

pub fn run(app: &App) -> Result<()> {
    App::print_json(&app.load())
}
