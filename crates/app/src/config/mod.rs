use clap::Parser;
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/studio.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Tokens come from the config file or environment, never the CLI.
    pub access_token: String,
    pub refresh_token: String,
    pub viewer_id: String,
    pub watch: bool,
    pub poll_seconds: u64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/".to_string(),
            access_token: String::new(),
            refresh_token: String::new(),
            viewer_id: String::new(),
            watch: false,
            poll_seconds: 60,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "balance_studio", disable_version_flag = true)]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override base URL (e.g. http://localhost:8000).
    #[arg(long)]
    base_url: Option<String>,
    /// Override the viewer's user id.
    #[arg(long)]
    viewer_id: Option<String>,
    /// Keep the dashboard open and refresh on signals and a poll interval.
    #[arg(long, conflicts_with = "no_watch")]
    watch: bool,
    /// Render once and exit, even when the config file enables watching.
    #[arg(long)]
    no_watch: bool,
    /// Override the poll interval in seconds.
    #[arg(long)]
    poll_seconds: Option<u64>,
    /// Override log level (e.g. debug).
    #[arg(long)]
    log_level: Option<String>,
}

pub fn load() -> Result<AppConfig> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("BALANCE_STUDIO"));
    let settings: AppConfig = builder.build()?.try_deserialize()?;

    Ok(apply_overrides(settings, args))
}

fn apply_overrides(mut settings: AppConfig, args: Args) -> AppConfig {
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(viewer_id) = args.viewer_id {
        settings.viewer_id = viewer_id;
    }
    if args.watch {
        settings.watch = true;
    }
    if args.no_watch {
        settings.watch = false;
    }
    if let Some(poll_seconds) = args.poll_seconds {
        settings.poll_seconds = poll_seconds;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    settings
}
