/// Configuration system for the SmartBin dashboard.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::DashboardConfig::default()`]
/// 2. **User config**: `~/.smartbin/config.toml`
/// 3. **Environment variables**: `SMARTBIN_*` overrides (highest precedence)
///
/// The server URL is the one setting the dashboard edits at runtime. It is
/// owned by a [`ConfigStore`], which persists every accepted change straight
/// back into the TOML file so it survives restarts.
pub mod schema;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::DashboardConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved dashboard configuration.
///
/// Merges defaults → `~/.smartbin/config.toml` → `SMARTBIN_*` env vars.
pub fn load() -> DashboardConfig {
    let mut config = load_file(global_config_path().as_deref());
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Load a config file, falling back to defaults when the path is `None`,
/// missing, or malformed.
pub fn load_file(path: Option<&Path>) -> DashboardConfig {
    path.and_then(|p| fs::read_to_string(p).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Apply variable overrides looked up through `lookup`.
///
/// Supported variables:
/// - `SMARTBIN_SERVER_URL`: backend base URL (ignored when blank)
/// - `SMARTBIN_TIMEOUT_MS`: per-request timeout
/// - `SMARTBIN_REFRESH_SECS`: auto-refresh period
/// - `SMARTBIN_LOG`: diagnostic file logging (`1`/`true`/`yes`/`on`)
pub fn apply_overrides(config: &mut DashboardConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("SMARTBIN_SERVER_URL")
        && !val.trim().is_empty()
    {
        config.server.url = val.trim().to_string();
    }
    if let Some(val) = lookup("SMARTBIN_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.server.timeout_ms = ms;
    }
    if let Some(val) = lookup("SMARTBIN_REFRESH_SECS")
        && let Ok(secs) = val.parse::<u64>()
        && secs > 0
    {
        config.refresh.interval_secs = secs;
    }
    if let Some(val) = lookup("SMARTBIN_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding all dashboard state: `~/.smartbin/`.
pub fn state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".smartbin"))
}

/// Path to the user config: `~/.smartbin/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("config.toml"))
}

/// Return the path to the config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

// ---------------------------------------------------------------------------
// Server URL store
// ---------------------------------------------------------------------------

/// Why a server URL change was not fully applied.
#[derive(Debug)]
pub enum StoreError {
    /// The URL was blank after trimming. Nothing changed.
    BlankUrl,
    /// The URL is active but could not be written to the config file.
    Persist(anyhow::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlankUrl => write!(f, "server URL must not be empty"),
            Self::Persist(e) => write!(f, "server URL could not be saved: {e:#}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BlankUrl => None,
            Self::Persist(e) => Some(e.as_ref()),
        }
    }
}

/// Holder of the active server URL.
///
/// `read` always returns the URL that new requests should use. `write`
/// rejects blank input and otherwise makes the trimmed URL active, then
/// persists it. A store without a backing path keeps the URL in memory only.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    url: String,
}

impl ConfigStore {
    /// Store backed by `~/.smartbin/config.toml`, seeded from the resolved config.
    pub fn open(config: &DashboardConfig) -> Self {
        Self {
            path: global_config_path(),
            url: config.server.url.clone(),
        }
    }

    /// Store backed by an explicit file. The URL is read from the file or
    /// falls back to the built-in default.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let url = load_file(Some(path.as_path())).server.url;
        Self {
            path: Some(path),
            url,
        }
    }

    /// Store that never touches disk.
    pub fn in_memory(url: impl Into<String>) -> Self {
        Self {
            path: None,
            url: url.into(),
        }
    }

    /// The active base URL.
    pub fn read(&self) -> &str {
        &self.url
    }

    /// Replace the active base URL.
    ///
    /// Fails without side effects when `url` is blank after trimming. A
    /// failed save still leaves the new URL active.
    pub fn write(&mut self, url: &str) -> Result<(), StoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::BlankUrl);
        }

        self.url = url.to_string();
        match &self.path {
            Some(path) => set_value_at(path, "server.url", url).map_err(StoreError::Persist),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.smartbin/config.toml`.
///
/// Returns an error if the file already exists and `force` is false.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    write_file(&path, &DashboardConfig::default_toml())?;
    Ok(path)
}

/// Set a single dotted config key (e.g. `refresh.interval_secs`) in the user
/// config file.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_value_at(&path, key, value)
}

/// Reset the user config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

/// Update one key in the TOML file at `path`, creating the file from the
/// defaults when it does not exist yet.
fn set_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?
    } else {
        toml::to_string_pretty(&DashboardConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that would no longer load as a dashboard config.
    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<DashboardConfig>(&updated)
        .with_context(|| format!("invalid value for '{key}': {value}"))?
        .validate()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    write_file(path, &updated)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The new value keeps the type of the existing one; unknown leaves in a
/// known section are stored as strings.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let (section_path, leaf) = match key.rsplit_once('.') {
        Some((sections, leaf)) => (Some(sections), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    let mut current = root;
    for part in section_path.into_iter().flat_map(|s| s.split('.')) {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected a table above '{key}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn overrides_replace_values() {
        let mut config = DashboardConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("SMARTBIN_SERVER_URL", " http://10.0.0.5:5000 "),
                ("SMARTBIN_TIMEOUT_MS", "2500"),
                ("SMARTBIN_REFRESH_SECS", "5"),
                ("SMARTBIN_LOG", "off"),
            ]),
        );
        assert_eq!(config.server.url, "http://10.0.0.5:5000");
        assert_eq!(config.server.timeout_ms, 2500);
        assert_eq!(config.refresh.interval_secs, 5);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn overrides_ignore_blank_and_invalid_values() {
        let mut config = DashboardConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("SMARTBIN_SERVER_URL", "   "),
                ("SMARTBIN_TIMEOUT_MS", "soon"),
                ("SMARTBIN_REFRESH_SECS", "0"),
            ]),
        );
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn load_file_falls_back_on_missing_or_malformed() {
        assert_eq!(load_file(None), DashboardConfig::default());

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(load_file(Some(missing.as_path())), DashboardConfig::default());

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[server\nurl = ").unwrap();
        assert_eq!(load_file(Some(broken.as_path())), DashboardConfig::default());
    }

    #[test]
    fn store_reads_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("config.toml"));
        assert_eq!(store.read(), schema::DEFAULT_SERVER_URL);
    }

    #[test]
    fn store_write_persists_trimmed_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut store = ConfigStore::at_path(&path);
        store.write("  http://192.168.1.20:5000  ").unwrap();
        assert_eq!(store.read(), "http://192.168.1.20:5000");

        let reopened = ConfigStore::at_path(&path);
        assert_eq!(reopened.read(), "http://192.168.1.20:5000");
    }

    #[test]
    fn store_write_keeps_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[refresh]\ninterval_secs = 7\n").unwrap();

        let mut store = ConfigStore::at_path(&path);
        store.write("http://bins:5000").unwrap();

        let config = load_file(Some(path.as_path()));
        assert_eq!(config.server.url, "http://bins:5000");
        assert_eq!(config.refresh.interval_secs, 7);
    }

    #[test]
    fn store_rejects_blank_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut store = ConfigStore::at_path(&path);
        store.write("http://first:5000").unwrap();

        assert!(matches!(store.write(""), Err(StoreError::BlankUrl)));
        assert!(matches!(store.write(" \t "), Err(StoreError::BlankUrl)));
        assert_eq!(store.read(), "http://first:5000");
        assert_eq!(load_file(Some(path.as_path())).server.url, "http://first:5000");
    }

    #[test]
    fn store_keeps_url_active_when_save_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();

        let mut store = ConfigStore::at_path(blocker.join("config.toml"));
        match store.write(" http://new:5000 ") {
            Err(StoreError::Persist(_)) => {}
            other => panic!("expected persist error, got {other:?}"),
        }
        assert_eq!(store.read(), "http://new:5000");
    }

    #[test]
    fn in_memory_store_does_not_touch_disk() {
        let mut store = ConfigStore::in_memory("http://a");
        store.write("http://b").unwrap();
        assert_eq!(store.read(), "http://b");
    }

    #[test]
    fn set_toml_value_preserves_types() {
        let mut root: toml::Value = toml::from_str(
            r#"
[refresh]
interval_secs = 30

[logging]
stderr = false
"#,
        )
        .unwrap();

        set_toml_value(&mut root, "refresh.interval_secs", "10").unwrap();
        set_toml_value(&mut root, "logging.stderr", "yes").unwrap();

        assert_eq!(root["refresh"]["interval_secs"].as_integer(), Some(10));
        assert_eq!(root["logging"]["stderr"].as_bool(), Some(true));
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root: toml::Value = toml::from_str("[refresh]\ninterval_secs = 30\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "x").is_err());
        assert!(set_toml_value(&mut root, "refresh.interval_secs", "often").is_err());
        assert!(set_toml_value(&mut root, "refresh.", "1").is_err());
    }

    #[test]
    fn set_value_at_rejects_type_breaking_edit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        // `server` is a table; a string at that key cannot load.
        assert!(set_value_at(&path, "server", "oops").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn set_value_at_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        set_value_at(&path, "refresh.interval_secs", "12").unwrap();

        assert!(set_value_at(&path, "refresh.interval_secs", "0").is_err());
        assert_eq!(load_file(Some(path.as_path())).refresh.interval_secs, 12);
    }

    #[test]
    fn zero_interval_in_file_runs_at_default_period() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[refresh]\ninterval_secs = 0\n").unwrap();

        let config = load_file(Some(path.as_path()));
        assert_eq!(config.refresh.interval(), std::time::Duration::from_secs(30));
    }
}
