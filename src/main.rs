use anyhow::{Context, Result};
use castgrid::app::{App, AppEvent};
use castgrid::config::Config;
use castgrid::ui;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Background results queued between UI frames.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Get the config directory path (~/.config/castgrid/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("castgrid"))
}

#[derive(Parser, Debug)]
#[command(
    name = "castgrid",
    about = "Terminal podcast home screen with cover-art accent colors"
)]
struct Args {
    /// Library file (default: ~/.config/castgrid/library.toml)
    #[arg(long, value_name = "FILE")]
    library: Option<PathBuf>,

    /// Config file (default: ~/.config/castgrid/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Theme for this session: dark or light
    #[arg(long)]
    theme: Option<String>,

    /// Log file (default: ~/.config/castgrid/castgrid.log)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// Log to a file; the terminal belongs to the UI. `RUST_LOG` overrides the
/// default filter.
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file '{}'", path.display()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("castgrid=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = std::fs::metadata(&config_dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o700);
            if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                eprintln!(
                    "Warning: failed to restrict {} to 0700: {e}",
                    config_dir.display()
                );
            }
        }
    }

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| config_dir.join("castgrid.log"));
    init_logging(&log_path)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(theme) = args.theme {
        config.theme = theme;
    }

    let library_path = args
        .library
        .unwrap_or_else(|| config_dir.join("library.toml"));
    if !library_path.exists() {
        tracing::info!(path = %library_path.display(), "Library file missing");
        eprintln!("Note: no library at {}", library_path.display());
        eprintln!("Showing an empty home screen. Press r to reload once it exists.");
    }

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(EVENT_CHANNEL_CAPACITY);
    let mut app = App::new(config, library_path, event_tx.clone())
        .context("Failed to create application")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting castgrid");
    ui::run(&mut app, event_tx, event_rx).await?;

    println!("Goodbye!");
    Ok(())
}
