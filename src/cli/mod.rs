//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `smartbin watch`: live terminal dashboard with auto-refresh
//! - `smartbin status`: one-shot snapshot (table or JSON)
//! - `smartbin history <device>` / `smartbin latest <device>`: per-bin detail
//! - `smartbin ping`: backend connectivity probe
//! - `smartbin config show|init|set|set-url|reset`: configuration management
//! - `smartbin logs`: recent diagnostic entries
//! - `smartbin web`: embedded web dashboard

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::api::HttpClient;
use crate::config::{self, ConfigStore, DashboardConfig, StoreError};
use crate::dashboard::{App, Dashboard};
use crate::diagnostics::{self, Diagnostics, Level};
use crate::render::{BinCard, terminal};
use crate::view::MessageKind;
use crate::web;

/// How often the watch screen is redrawn.
const REDRAW_INTERVAL: Duration = Duration::from_secs(1);

/// Output format for snapshot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Build the dashboard state from the resolved configuration.
fn build_dashboard(cfg: &DashboardConfig) -> Dashboard<HttpClient> {
    Dashboard::new(
        HttpClient::from_config(&cfg.server),
        ConfigStore::open(cfg),
        Diagnostics::from_config(&cfg.logging),
    )
    .with_message_ttl(Duration::from_secs(cfg.refresh.message_secs))
}

// ---------------------------------------------------------------------------
// smartbin watch
// ---------------------------------------------------------------------------

/// A line typed into the watch screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    Refresh,
    SetUrl(String),
    TestConnection,
    Quit,
    Unknown(String),
    Nothing,
}

impl WatchCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match head {
            "" => Self::Nothing,
            "r" | "refresh" => Self::Refresh,
            "u" | "url" => Self::SetUrl(rest.trim().to_string()),
            "t" | "test" => Self::TestConnection,
            "q" | "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Live dashboard: initial load, auto-refresh, and stdin commands.
pub fn run_watch() -> Result<()> {
    let cfg = config::load();
    let dashboard = Arc::new(build_dashboard(&cfg));
    let app = App::init(Arc::clone(&dashboard), cfg.refresh.interval());

    let (lines_tx, lines) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines().map_while(|line| line.ok()) {
            if lines_tx.send(line).is_err() {
                break;
            }
        }
    });

    loop {
        redraw(&dashboard)?;

        let line = match lines.recv_timeout(REDRAW_INTERVAL) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        // Actions run off the input loop so the screen keeps updating.
        let d = Arc::clone(&dashboard);
        match WatchCommand::parse(&line) {
            WatchCommand::Quit => break,
            WatchCommand::Nothing => {}
            WatchCommand::Refresh => {
                thread::spawn(move || d.refresh());
            }
            WatchCommand::SetUrl(url) => {
                thread::spawn(move || {
                    let _ = d.update_server_url(&url);
                });
            }
            WatchCommand::TestConnection => {
                thread::spawn(move || d.test_connection());
            }
            WatchCommand::Unknown(cmd) => {
                d.show_message(&format!("Unknown command: {cmd}"), MessageKind::Error);
            }
        }
    }

    app.dispose();
    Ok(())
}

fn redraw(dashboard: &Dashboard<HttpClient>) -> Result<()> {
    let view = dashboard.view();
    let screen = terminal::render_view(&view, &dashboard.server_url(), Instant::now());

    let mut stdout = std::io::stdout().lock();
    write!(stdout, "\x1b[2J\x1b[H{screen}")?;
    writeln!(
        stdout,
        "\n{}",
        "[r] refresh  [u <url>] set server  [t] test connection  [q] quit".dimmed()
    )?;
    stdout.flush().context("failed to flush stdout")
}

// ---------------------------------------------------------------------------
// smartbin status
// ---------------------------------------------------------------------------

/// Load once and print the dashboard.
pub fn run_status(format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let dashboard = build_dashboard(&cfg);
    let loaded = dashboard.load_all();
    let view = dashboard.view();

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "server_url": dashboard.server_url(),
                "stats": view.stats,
                "bins": view.bins.cards(),
                "placeholder": view.bins.placeholder(),
                "error": loaded.as_ref().err().map(|e| e.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            print!(
                "{}",
                terminal::render_view(&view, &dashboard.server_url(), Instant::now())
            );
        }
    }

    loaded
}

// ---------------------------------------------------------------------------
// smartbin history / latest
// ---------------------------------------------------------------------------

/// Print recent readings for one bin.
pub fn run_history(device_id: &str, limit: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let dashboard = build_dashboard(&cfg);
    let limit = limit.unwrap_or(cfg.refresh.history_limit);

    let readings = dashboard.load_bin_history(device_id, limit);
    print!("{}", terminal::render_history(device_id, &readings));
    Ok(())
}

/// Print the latest reading for one bin as a card.
pub fn run_latest(device_id: &str) -> Result<()> {
    let cfg = config::load();
    let dashboard = build_dashboard(&cfg);

    match dashboard.load_bin_latest(device_id) {
        Some(reading) => {
            print!("{}", terminal::render_card(&BinCard::from_reading(&reading)));
            Ok(())
        }
        None => anyhow::bail!("no data found for device {device_id}"),
    }
}

// ---------------------------------------------------------------------------
// smartbin ping
// ---------------------------------------------------------------------------

/// Probe the backend root and report the outcome.
pub fn run_ping() -> Result<()> {
    let cfg = config::load();
    let dashboard = build_dashboard(&cfg);
    let ok = dashboard.test_connection();

    let text = dashboard
        .status()
        .map(|m| m.text)
        .unwrap_or_default();
    if ok {
        println!("{} {} ({})", "✓".green().bold(), text, dashboard.server_url());
        Ok(())
    } else {
        println!("{} {} ({})", "✗".red().bold(), text, dashboard.server_url());
        anyhow::bail!("{} is not reachable", dashboard.server_url())
    }
}

// ---------------------------------------------------------------------------
// smartbin config show | init | set | set-url | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective SmartBin Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let file_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if file_exists {
        println!("  {} {}", "✓".green(), "~/.smartbin/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.smartbin/config.toml (not found)".dimmed()
        );
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "SMARTBIN_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single config key.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Persist a new server URL through the same store the dashboard uses.
pub fn run_config_set_url(url: &str) -> Result<()> {
    let mut store = ConfigStore::open(&config::load());
    match store.write(url) {
        Ok(()) => {}
        Err(StoreError::BlankUrl) => anyhow::bail!("Please enter a valid server URL"),
        Err(StoreError::Persist(e)) => return Err(e.context("failed to save server URL")),
    }
    println!("{} Server URL set to {}", "✓".green().bold(), store.read().bold());
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// smartbin logs
// ---------------------------------------------------------------------------

/// Print the most recent diagnostic entries.
pub fn run_logs(tail: usize) -> Result<()> {
    let path = diagnostics::diagnostics_log_path().context("could not determine home directory")?;
    let entries = diagnostics::read_recent(&path, tail);

    if entries.is_empty() {
        println!("{}", "No diagnostics recorded yet.".yellow());
        return Ok(());
    }

    for entry in entries {
        let level = match entry.level {
            Level::Error => entry.level.to_string().red(),
            Level::Info => entry.level.to_string().green(),
        };
        println!(
            "{} {:<5} {:<18} {}",
            entry.timestamp.dimmed(),
            level,
            entry.operation,
            entry.message
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// smartbin web
// ---------------------------------------------------------------------------

/// Serve the web dashboard while the auto-refresh timer runs.
pub fn run_web(addr: &str) -> Result<()> {
    let cfg = config::load();
    let dashboard = Arc::new(build_dashboard(&cfg));
    let app = App::init(Arc::clone(&dashboard), cfg.refresh.interval());

    let served = web::serve(addr, dashboard);
    app.dispose();
    served
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
