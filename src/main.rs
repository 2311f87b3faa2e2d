use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use material_theme_sync::change_gate::Fingerprint;
use material_theme_sync::config::{self, Config};
use material_theme_sync::engine::SyncService;
use material_theme_sync::error::ResultExt;
use material_theme_sync::logging;
use material_theme_sync::palette::Palette;
use material_theme_sync::preferences::PreferencesStore;
use material_theme_sync::provider::NativeHostTransport;
use material_theme_sync::sink::{JsonFileSink, JsonlSink, ThemeSink};
use material_theme_sync::stdin_commands::{self, Flow};
use material_theme_sync::theme::map_palette;

#[derive(Parser)]
#[command(
    name = "material-sync",
    about = "Sync a browser theme with Material You colors"
)]
struct Cli {
    /// Config file (default: ~/.material-sync/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the sync daemon, controlled by JSONL commands on stdin
    Run,
    /// Fetch colors once, apply the theme and print the outcome
    Refresh,
    /// Print the theme for a palette JSON file (stdin when omitted)
    Map { file: Option<PathBuf> },
    /// Show saved preferences and resolved paths
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init();

    let config = match &cli.config {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => config::load_config(),
    };

    match cli.command {
        Command::Run => run(&config),
        Command::Refresh => refresh_once(&config),
        Command::Map { file } => map(file),
        Command::Status => status(&config, cli.config),
    }
}

fn theme_sink(config: &Config) -> Box<dyn ThemeSink> {
    match config.theme_output_path() {
        Some(path) => Box::new(JsonFileSink::new(path)),
        None => Box::new(JsonlSink::new(io::stdout())),
    }
}

fn load_preferences() -> PreferencesStore {
    let mut prefs = PreferencesStore::new();
    prefs.load().warn_on_err();
    prefs
}

fn run(config: &Config) -> Result<()> {
    let mut prefs = load_preferences();
    let service = SyncService::start(
        config,
        Box::new(NativeHostTransport::from_config(&config.provider)),
        theme_sink(config),
        prefs.auto_mode(),
    )
    .context("Failed to start sync engine")?;
    let handle = service.handle();

    let commands = stdin_commands::start_stdin_listener();
    // Ends on quit, or when stdin closes and the listener drops its sender
    while let Ok(command) = commands.recv_blocking() {
        let (reply, flow) = stdin_commands::handle_command(command, &handle, &mut prefs);
        stdin_commands::write_reply(&mut io::stdout().lock(), &reply)
            .context("Failed to write reply to stdout")?;
        if flow == Flow::Quit {
            break;
        }
    }

    info!("Shutting down");
    service.shutdown();
    Ok(())
}

fn refresh_once(config: &Config) -> Result<()> {
    let mut prefs = load_preferences();
    let service = SyncService::start(
        config,
        Box::new(NativeHostTransport::from_config(&config.provider)),
        theme_sink(config),
        false,
    )
    .context("Failed to start sync engine")?;

    let outcome = service.handle().refresh();
    service.shutdown();

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.success {
        bail!(outcome.error.unwrap_or_else(|| "refresh failed".to_string()));
    }

    if let Some(colors) = outcome.colors {
        prefs.record_refresh(colors, Utc::now());
        prefs.save()?;
    }
    Ok(())
}

fn map(file: Option<PathBuf>) -> Result<()> {
    let raw = match &file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read palette from stdin")?;
            buf
        }
    };

    // Accept a bare palette or a whole provider response
    let mut value: serde_json::Value = serde_json::from_str(&raw).context("Invalid palette JSON")?;
    if let Some(colors) = value.get_mut("colors") {
        value = colors.take();
    }
    let palette: Palette = serde_json::from_value(value).context("Palette must be a JSON object")?;

    let theme = map_palette(&palette);
    let out = json!({
        "fingerprint": Fingerprint::of(&theme).as_str(),
        "theme": theme,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn status(config: &Config, config_override: Option<PathBuf>) -> Result<()> {
    let prefs = load_preferences();
    let swatches: Vec<_> = prefs
        .get()
        .last_colors
        .as_ref()
        .map(|colors| {
            colors
                .swatches()
                .into_iter()
                .map(|(role, color)| json!({ "role": role.as_str(), "color": color }))
                .collect()
        })
        .unwrap_or_default();

    let out = json!({
        "configPath": config_override.unwrap_or_else(config::config_path),
        "preferencesPath": prefs.path(),
        "logPath": logging::log_path(),
        "themeOutput": config.theme_output_path(),
        "provider": config.provider,
        "preferences": prefs.get(),
        "swatches": swatches,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
