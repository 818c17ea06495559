use crate::core::models::Theme;
use crate::core::settings::Settings;
use crate::icons::{AnimationDescriptor, IconEvent, IconProvider};
use crate::theme::{self, PortalNotificationCenter, COLOR_SCHEME_CHANGED};
use anyhow::{Context, Result};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

const DISPATCH_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Serialize)]
struct IconSetSnapshot {
    theme: Theme,
    lock: AnimationDescriptor,
    unlock: AnimationDescriptor,
    spinner: AnimationDescriptor,
}

impl IconSetSnapshot {
    fn capture(provider: &IconProvider) -> Self {
        Self {
            theme: provider.current_theme(),
            lock: provider.lock_animation(false),
            unlock: provider.unlock_animation(),
            spinner: provider.spinner_animation(),
        }
    }
}

pub async fn run(settings: Settings, json: bool) -> Result<()> {
    let center = Rc::new(
        PortalNotificationCenter::connect().context("Failed to listen for appearance changes")?,
    );
    let appearance =
        theme::appearance_for(settings.theme.mode).context("Failed to read desktop appearance")?;

    let mut provider = IconProvider::new(
        settings.icons.clone(),
        appearance,
        center.clone(),
        COLOR_SCHEME_CHANGED,
    )
    .context("Failed to set up the icon provider")?;

    let refresh = Rc::new(Cell::new(false));
    let flag = Rc::clone(&refresh);
    let listener = provider.on(IconEvent::ThemeChanged, move || flag.set(true));
    tracing::debug!(
        listeners = provider.listener_count(IconEvent::ThemeChanged),
        "Registered theme change listener"
    );

    publish(&provider, json)?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(DISPATCH_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                center
                    .dispatch_pending()
                    .context("Stopped receiving appearance changes")?;
                if refresh.replace(false) {
                    publish(&provider, json)?;
                }
            }
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    provider.off(listener);
    provider.destroy();
    tracing::info!(watching = provider.is_watching(), "Daemon stopped");
    Ok(())
}

fn publish(provider: &IconProvider, json: bool) -> Result<()> {
    let snapshot = IconSetSnapshot::capture(provider);

    tracing::info!(
        theme = ?snapshot.theme,
        lock = %snapshot.lock.path_pattern,
        spinner = %snapshot.spinner.path_pattern,
        "Icon set updated"
    );

    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    }
    Ok(())
}
