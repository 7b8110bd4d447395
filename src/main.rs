use anyhow::Result;
use clap::{Parser, Subcommand};

use smartbin::cli;

#[derive(Debug, Parser)]
#[command(name = "smartbin")]
#[command(about = "Dashboard for SmartBin waste-bin telemetry")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Live terminal dashboard with auto-refresh
    Watch,
    /// Load once and print statistics and bin cards
    Status {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show recent readings for one bin
    History {
        device_id: String,
        /// Number of readings (default: refresh.history_limit)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show the latest reading for one bin
    Latest { device_id: String },
    /// Check that the server answers
    Ping,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show recent diagnostic log entries
    Logs {
        #[arg(long, default_value = "20")]
        tail: usize,
    },
    /// Serve the dashboard as a local web page
    Web {
        #[arg(long, default_value = "127.0.0.1:9747")]
        addr: String,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default config file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `refresh.interval_secs 10`
    Set { key: String, value: String },
    /// Change the server URL
    SetUrl { url: String },
    /// Overwrite the config file with defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Watch => cli::run_watch(),
        Commands::Status { format } => {
            cli::run_status(cli::OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::History { device_id, limit } => cli::run_history(&device_id, limit),
        Commands::Latest { device_id } => cli::run_latest(&device_id),
        Commands::Ping => cli::run_ping(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::SetUrl { url } => cli::run_config_set_url(&url),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Logs { tail } => cli::run_logs(tail),
        Commands::Web { addr } => cli::run_web(&addr),
    }
}
