use std::path::Path;

use anyhow::{Context, Result};

use crate::app::App;

pub fn run(app: &App, dir: Option<&Path>) -> Result<()> {
    let path = app.store.backup(dir).context("Failed to create backup")?;
    println!("Backup created: {}", path.display());
    Ok(())
}

pub fn run_restore(app: &App, file: &Path) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Backup file not found: {}", file.display());
    }
    app.store
        .restore(file)
        .with_context(|| format!("Failed to restore from {}", file.display()))?;
    println!("State restored from: {}", file.display());
    Ok(())
}
