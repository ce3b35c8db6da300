use anyhow::{Context, Result};
use serde_json::Value;

use eng_tutor_lib::state::DailyContent;

use crate::app::App;

pub fn run(app: &App, content_type: &str, content: &str, date: Option<&str>) -> Result<()> {
    let kind: DailyContent = content_type.parse()?;
    let value: Value = serde_json::from_str(content).context("Invalid JSON content")?;
    let date = App::parse_date(date)?;

    let path = app
        .store
        .save_daily_content(kind, &value, date)
        .with_context(|| format!("Failed to save {}", kind))?;

    println!("Saved to: {}", path.display());
    Ok(())
}
