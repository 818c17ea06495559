use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod core;
mod daemon;
mod icons;
mod theme;

use crate::core::models::Theme;
use crate::core::settings::Settings;

#[derive(Parser)]
#[command(name = "menubar-icons")]
#[command(author, version, about = "Theme-aware animated tray icon sequences")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the desktop theme and publish the matching icon set
    Daemon {
        /// Print the icon set as JSON lines on stdout
        #[arg(long)]
        json: bool,

        /// Send logs to the systemd journal
        #[arg(long)]
        journald: bool,
    },

    /// Show the descriptor for one animation
    Animation {
        #[arg(value_enum)]
        kind: cli::animation::AnimationArg,

        /// Use this theme instead of the desktop's
        #[arg(long, value_enum)]
        theme: Option<Theme>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// List frame files in playback order
        #[arg(long)]
        frames: bool,

        /// Milliseconds per frame
        #[arg(long)]
        speed: Option<u64>,

        /// Frame indices to play, e.g. 1..9 (inclusive)
        #[arg(long, value_name = "FIRST..LAST")]
        range: Option<String>,
    },

    /// Show the theme icons are resolved for
    Theme {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(debug: bool, journald: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if journald {
        match tracing_journald::layer() {
            Ok(layer) => {
                tracing_subscriber::registry().with(filter).with(layer).init();
                return;
            }
            Err(e) => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                    .init();
                tracing::warn!(error = %e, "journald unavailable, logging to stderr");
                return;
            }
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Reads just the `debug` flag so logging is up before the real load logs.
fn debug_enabled() -> bool {
    Settings::config_path()
        .and_then(|path| std::fs::read_to_string(path).ok())
        .and_then(|content| toml::from_str::<Settings>(&content).ok())
        .map(|settings| settings.debug)
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon { json, journald } => {
            init_logging(debug_enabled(), journald);
            let settings = Settings::load()?;
            daemon::run(settings, json).await
        }
        Commands::Animation {
            kind,
            theme,
            json,
            frames,
            speed,
            range,
        } => {
            init_logging(debug_enabled(), false);
            let overrides = cli::animation::Overrides { speed, range };
            cli::animation::run(kind, theme, json, frames, &overrides)
        }
        Commands::Theme { json } => {
            init_logging(debug_enabled(), false);
            cli::theme::run(json)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}
