use crate::core::models::{Theme, ThemeMode};
use crate::core::settings::Settings;
use crate::theme::appearance_for;
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Serialize)]
struct ThemeOutput {
    theme: Theme,
    mode: ThemeMode,
}

pub fn run(json: bool) -> Result<()> {
    let settings = Settings::load()?;
    let appearance =
        appearance_for(settings.theme.mode).context("Failed to read desktop appearance")?;

    let output = ThemeOutput {
        theme: appearance.current_theme(),
        mode: settings.theme.mode,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", output.theme.name());
    }

    Ok(())
}
