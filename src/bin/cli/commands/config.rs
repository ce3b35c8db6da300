use anyhow::Result;
use serde_json::json;

use eng_tutor_lib::state::{CefrLevel, TutorStyle};

use crate::app::App;

pub fn run(app: &App, cefr: Option<&str>, style: Option<&str>, oral_ratio: Option<i64>) -> Result<()> {
    let mut state = app.load();

    if cefr.is_none() && style.is_none() && oral_ratio.is_none() {
        let preferences = &state.preferences;
        let output = json!({
            "cefr_level": preferences.cefr_level,
            "tutor_style": preferences.tutor_style,
            "oral_ratio": preferences.oral_ratio_percent(),
            "topics": preferences.topics,
            "schedule": state.schedule,
        });
        return App::print_json(&output);
    }

    // Validate everything before changing anything
    let cefr = cefr.map(str::parse::<CefrLevel>).transpose()?;
    let style = style.map(str::parse::<TutorStyle>).transpose()?;

    if let Some(percent) = oral_ratio {
        state.preferences.set_oral_ratio_percent(percent)?;
    }
    if let Some(level) = cefr {
        state.preferences.cefr_level = level;
        println!("Updated CEFR level to: {}", level);
    }
    if let Some(style) = style {
        state.preferences.tutor_style = style;
        println!("Updated tutor style to: {}", style);
    }
    if let Some(percent) = oral_ratio {
        println!("Updated oral ratio to: {}%", percent);
    }

    app.save(&state)?;
    println!("Configuration updated successfully");
    Ok(())
}
