//! `relay-tui` — Terminal control panel for a network relay device.
//!
//! Built on [ratatui](https://ratatui.rs) over `relay-core`'s
//! [`DeviceSession`](relay_core::DeviceSession). Three views: Login,
//! Dashboard (live status badges + time slots, refreshed by a 2 s
//! background poll), and the time-slot editor.
//!
//! Logs are written to a file (default `/tmp/relay-tui.log`) to avoid
//! corrupting the terminal UI. A background bridge task forwards session
//! state changes into the TUI action loop while authenticated.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app launch.

mod action;
mod app;
mod bridge;
mod component;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use relay_core::{DeviceSession, SessionConfig};

use crate::app::App;

/// Terminal control panel for a network relay device.
#[derive(Parser, Debug)]
#[command(name = "relay-tui", version, about)]
struct Cli {
    /// Device address (e.g., 192.168.4.1); prefills the login screen
    #[arg(short = 'a', long, env = "RELAY_DEVICE_ADDRESS")]
    address: Option<String>,

    /// Basic Auth username; prefills the login screen
    #[arg(short = 'u', long, env = "RELAY_USERNAME")]
    username: Option<String>,

    /// Basic Auth password; prefills the login screen
    #[arg(short = 'p', long, env = "RELAY_PASSWORD")]
    password: Option<String>,

    /// Log file path (defaults to /tmp/relay-tui.log)
    #[arg(long, default_value = "/tmp/relay-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "relay_tui={log_level},relay_core={log_level},relay_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("relay-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli);

    // Prefill priority: CLI flag > saved config > factory defaults
    let prefill = screens::LoginPrefill {
        address: cli
            .address
            .clone()
            .or_else(|| relay_config::load_config_or_default().device_address),
        username: cli.username.clone(),
        password: cli.password.clone(),
    };

    info!(
        address = prefill.address.as_deref().unwrap_or("(not set)"),
        "starting relay-tui"
    );

    let session = DeviceSession::new(SessionConfig::default());
    let mut app = App::new(session, prefill);
    app.run().await?;

    Ok(())
}
