use std::fmt;
use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;
use crate::config::state_dir;

// ---------------------------------------------------------------------------
// Diagnostic entry (JSONL)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single line of `~/.smartbin/diagnostics.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub timestamp: String,
    pub level: Level,
    /// Dashboard operation that produced the entry, e.g. `load_bins`.
    pub operation: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Best-effort diagnostic sink.
///
/// Writes never fail the caller: an unwritable log file is skipped silently.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    path: Option<PathBuf>,
    stderr: bool,
}

impl Diagnostics {
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            path: if config.enabled {
                diagnostics_log_path()
            } else {
                None
            },
            stderr: config.stderr,
        }
    }

    /// Sink writing to an explicit file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            stderr: false,
        }
    }

    /// Sink that drops everything.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn info(&self, operation: &str, server_url: Option<&str>, message: impl fmt::Display) {
        self.record(Level::Info, operation, server_url, message);
    }

    pub fn error(&self, operation: &str, server_url: Option<&str>, message: impl fmt::Display) {
        self.record(Level::Error, operation, server_url, message);
    }

    fn record(
        &self,
        level: Level,
        operation: &str,
        server_url: Option<&str>,
        message: impl fmt::Display,
    ) {
        let message = message.to_string();

        if self.stderr {
            eprintln!("[smartbin] {level} {operation}: {message}");
        }

        let Some(path) = &self.path else {
            return;
        };

        let entry = DiagnosticEntry {
            timestamp: Utc::now().to_rfc3339(),
            level,
            operation: operation.to_string(),
            message,
            server_url: server_url.map(str::to_string),
        };

        let _ = append_entry(path, &entry);
    }
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Read the last `count` entries from `path`, oldest first.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_recent(path: &Path, count: usize) -> Vec<DiagnosticEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    let entries: Vec<DiagnosticEntry> = BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect();

    let skip = entries.len().saturating_sub(count);
    entries.into_iter().skip(skip).collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_entry(path: &Path, entry: &DiagnosticEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the diagnostics log file.
pub fn diagnostics_log_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("diagnostics.jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("diagnostics.jsonl");
        let diag = Diagnostics::at_path(&path);

        diag.error("load_bins", Some("http://localhost:5000"), "server returned HTTP 500");
        diag.info("update_server_url", None, "server URL set");

        let entries = read_recent(&path, 10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, Level::Error);
        assert_eq!(entries[0].operation, "load_bins");
        assert_eq!(entries[0].server_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(entries[1].level, Level::Info);
        assert!(entries[1].server_url.is_none());
    }

    #[test]
    fn read_recent_keeps_tail_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("diagnostics.jsonl");
        let diag = Diagnostics::at_path(&path);

        diag.info("a", None, "1");
        fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut f| writeln!(f, "not json"))
            .unwrap();
        diag.info("b", None, "2");
        diag.info("c", None, "3");

        let entries = read_recent(&path, 2);
        let ops: Vec<_> = entries.iter().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops, ["b", "c"]);
    }

    #[test]
    fn disabled_sink_writes_nothing() {
        let diag = Diagnostics::disabled();
        diag.error("load_all", None, "ignored");
        assert!(read_recent(Path::new("/nonexistent/diagnostics.jsonl"), 5).is_empty());
    }
}
