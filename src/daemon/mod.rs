mod app;

use crate::core::settings::Settings;
use anyhow::Result;

pub async fn run(settings: Settings, json: bool) -> Result<()> {
    tracing::info!("Starting menubar-icons daemon");
    app::run(settings, json).await
}
