/// Configuration schema and defaults for the SmartBin dashboard.
///
/// Defines the TOML-serializable configuration structure with the
/// `[server]`, `[refresh]` and `[logging]` sections.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backend base URL.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Default transport timeout for a single API request.
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default auto-refresh period.
const DEFAULT_INTERVAL_SECS: u64 = 30;

/// Default display duration of a status message.
const DEFAULT_MESSAGE_SECS: u64 = 3;

/// Default number of readings requested by a history lookup.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level dashboard configuration.
///
/// Maps directly to `~/.smartbin/config.toml`. All sections and fields are
/// optional; missing values fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the SmartBin API (no trailing path).
    pub url: String,
    /// Per-request transport timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

// ---------------------------------------------------------------------------
// [refresh]
// ---------------------------------------------------------------------------

/// Auto-refresh and view timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between scheduled refreshes.
    pub interval_secs: u64,
    /// Seconds a status message stays visible.
    pub message_secs: u64,
    /// Readings requested by `history` when no limit is given.
    pub history_limit: u32,
}

impl RefreshConfig {
    /// Auto-refresh period. A zero interval falls back to the default.
    pub fn interval(&self) -> Duration {
        let secs = if self.interval_secs == 0 {
            DEFAULT_INTERVAL_SECS
        } else {
            self.interval_secs
        };
        Duration::from_secs(secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            message_secs: DEFAULT_MESSAGE_SECS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Diagnostic log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append diagnostics to `~/.smartbin/diagnostics.jsonl`.
    pub enabled: bool,
    /// Mirror diagnostics to stderr.
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stderr: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation and default TOML content
// ---------------------------------------------------------------------------

impl DashboardConfig {
    /// Reject values the dashboard cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.refresh.interval_secs == 0 {
            anyhow::bail!("refresh.interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `smartbin config init`.
    pub fn default_toml() -> String {
        r#"# SmartBin dashboard configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (SMARTBIN_*)
#   2. User config (~/.smartbin/config.toml)
#   3. Built-in defaults

[server]
url = "http://localhost:5000"
timeout_ms = 10000

[refresh]
interval_secs = 30    # auto-refresh period
message_secs = 3      # how long status messages stay visible
history_limit = 20    # readings fetched by `smartbin history`

[logging]
enabled = true        # append to ~/.smartbin/diagnostics.jsonl
stderr = false        # also print diagnostics to stderr
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
