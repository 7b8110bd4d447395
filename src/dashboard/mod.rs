//! Dashboard state and data loading.
//!
//! [`Dashboard`] is the one application-state object: it owns the API client,
//! the server URL store and the [`View`]. Every refresh path (timer tick,
//! manual refresh, URL change) goes through [`Dashboard::load_all`].
//!
//! [`App`] adds the lifecycle: `init` performs the first load and starts the
//! auto-refresh [`Scheduler`]; `dispose` stops it.

pub mod scheduler;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::api::{ApiError, BinApi, BinReading};
use crate::config::{ConfigStore, StoreError};
use crate::diagnostics::Diagnostics;
use crate::view::{BinsRegion, MessageKind, StatsPanel, StatusMessage, View};

pub use scheduler::Scheduler;

/// Shown when any part of a refresh failed.
pub const LOAD_ERROR_TEXT: &str = "Error loading data. Check server connection.";
pub const REFRESHED_TEXT: &str = "Data refreshed";
pub const INVALID_URL_TEXT: &str = "Please enter a valid server URL";
pub const URL_UPDATED_TEXT: &str = "Server URL updated successfully";
pub const URL_NOT_SAVED_TEXT: &str = "Server URL updated, but it could not be saved";
pub const CONNECTED_TEXT: &str = "Server connection successful";
pub const CONNECTION_FAILED_TEXT: &str = "Server connection failed";
pub const UNREACHABLE_TEXT: &str = "Cannot connect to server";

/// Default status message display time.
const DEFAULT_MESSAGE_TTL: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Application state shared by the scheduler and user actions.
pub struct Dashboard<A> {
    api: A,
    store: Mutex<ConfigStore>,
    view: Mutex<View>,
    generation: AtomicU64,
    message_ttl: Duration,
    diagnostics: Diagnostics,
}

impl<A: BinApi> Dashboard<A> {
    pub fn new(api: A, store: ConfigStore, diagnostics: Diagnostics) -> Self {
        Self {
            api,
            store: Mutex::new(store),
            view: Mutex::new(View::default()),
            generation: AtomicU64::new(0),
            message_ttl: DEFAULT_MESSAGE_TTL,
            diagnostics,
        }
    }

    /// Override how long status messages stay visible.
    pub fn with_message_ttl(mut self, ttl: Duration) -> Self {
        self.message_ttl = ttl;
        self
    }

    /// The backend this dashboard talks to.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The base URL new requests are sent to.
    pub fn server_url(&self) -> String {
        lock(&self.store).read().to_string()
    }

    /// A snapshot of the current view.
    pub fn view(&self) -> View {
        lock(&self.view).clone()
    }

    /// The status message visible right now, if any.
    pub fn status(&self) -> Option<StatusMessage> {
        lock(&self.view).status_at(Instant::now()).cloned()
    }

    /// Show a transient status message.
    pub fn show_message(&self, text: &str, kind: MessageKind) {
        lock(&self.view).show(StatusMessage::new(text, kind, self.message_ttl));
    }

    // -- Loading --

    /// Refresh statistics and bins concurrently.
    ///
    /// Both requests are issued against the URL active at call time. Each one
    /// updates its own region; if either fails, a single error message is
    /// shown and the combined failure is returned.
    pub fn load_all(&self) -> Result<()> {
        let generation = self.next_generation();
        let base = self.server_url();

        let (stats, bins) = thread::scope(|s| {
            let stats = s.spawn(|| self.load_statistics_at(generation, &base));
            let bins = self.load_bins_at(generation, &base);
            let stats = stats.join().unwrap_or_else(|_| {
                Err(ApiError::Transport("statistics worker panicked".to_string()))
            });
            (stats, bins)
        });

        let failures: Vec<String> = [("statistics", stats), ("bins", bins)]
            .into_iter()
            .filter_map(|(what, result)| result.err().map(|e| format!("{what}: {e}")))
            .collect();

        if failures.is_empty() {
            return Ok(());
        }

        let summary = failures.join("; ");
        self.diagnostics
            .error("load_all", Some(base.as_str()), format!("error loading data: {summary}"));
        self.show_message(LOAD_ERROR_TEXT, MessageKind::Error);
        anyhow::bail!("error loading data from {base}: {summary}")
    }

    /// Refresh the statistics fields only. Failures are logged and leave the
    /// fields untouched; no message is shown.
    pub fn load_statistics(&self) -> Result<(), ApiError> {
        let generation = self.next_generation();
        let base = self.server_url();
        self.load_statistics_at(generation, &base)
    }

    /// Refresh the bins region only. Failures replace the region with the
    /// error placeholder.
    pub fn load_bins(&self) -> Result<(), ApiError> {
        let generation = self.next_generation();
        let base = self.server_url();
        self.load_bins_at(generation, &base)
    }

    /// Readings for one device, newest first. Empty on any failure.
    pub fn load_bin_history(&self, device_id: &str, limit: u32) -> Vec<BinReading> {
        let base = self.server_url();
        self.api
            .history(&base, device_id, limit)
            .unwrap_or_else(|e| {
                self.diagnostics.error(
                    "load_bin_history",
                    Some(base.as_str()),
                    format!("error loading bin history for {device_id}: {e}"),
                );
                Vec::new()
            })
    }

    /// Latest reading for one device, or `None` if unknown or unreachable.
    pub fn load_bin_latest(&self, device_id: &str) -> Option<BinReading> {
        let base = self.server_url();
        match self.api.latest(&base, device_id) {
            Ok(reading) => Some(reading),
            Err(e) => {
                self.diagnostics.error(
                    "load_bin_latest",
                    Some(base.as_str()),
                    format!("error loading latest reading for {device_id}: {e}"),
                );
                None
            }
        }
    }

    fn load_statistics_at(&self, generation: u64, base: &str) -> Result<(), ApiError> {
        match self.api.statistics(base) {
            Ok(stats) => {
                lock(&self.view).apply_stats(generation, StatsPanel::from(&stats));
                Ok(())
            }
            Err(e) => {
                self.diagnostics
                    .error("load_statistics", Some(base), format!("error loading statistics: {e}"));
                lock(&self.view).skip_stats(generation);
                Err(e)
            }
        }
    }

    fn load_bins_at(&self, generation: u64, base: &str) -> Result<(), ApiError> {
        match self.api.bins(base) {
            Ok(readings) => {
                let region = BinsRegion::from_readings(&readings);
                lock(&self.view).apply_bins(generation, region);
                Ok(())
            }
            Err(e) => {
                self.diagnostics
                    .error("load_bins", Some(base), format!("error loading bins: {e}"));
                lock(&self.view).apply_bins(generation, BinsRegion::Error);
                Err(e)
            }
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    // -- User actions --

    /// Manual refresh. Returns whether every request succeeded.
    pub fn refresh(&self) -> bool {
        let ok = self.load_all().is_ok();
        if ok {
            self.show_message(REFRESHED_TEXT, MessageKind::Success);
        }
        ok
    }

    /// Switch to a new server URL and reload from it.
    ///
    /// Blank input shows an error and changes nothing. A URL that cannot be
    /// saved is still used for this session. Requests already in flight
    /// against the old URL are left to finish.
    pub fn update_server_url(&self, url: &str) -> Result<()> {
        let written = lock(&self.store).write(url);
        let base = self.server_url();
        match written {
            Ok(()) => {
                self.diagnostics
                    .info("update_server_url", Some(base.as_str()), "server URL updated");
                self.show_message(URL_UPDATED_TEXT, MessageKind::Success);
            }
            Err(StoreError::BlankUrl) => {
                self.show_message(INVALID_URL_TEXT, MessageKind::Error);
                return Err(StoreError::BlankUrl.into());
            }
            Err(StoreError::Persist(e)) => {
                self.diagnostics.error(
                    "update_server_url",
                    Some(base.as_str()),
                    format!("failed to save server URL: {e:#}"),
                );
                self.show_message(URL_NOT_SAVED_TEXT, MessageKind::Error);
            }
        }

        // The reload reports its own failure through the status message.
        let _ = self.load_all();
        Ok(())
    }

    /// Probe the server root. Shows the outcome and returns reachability.
    pub fn test_connection(&self) -> bool {
        let base = self.server_url();
        let (ok, text) = match self.api.probe(&base) {
            Ok(()) => (true, CONNECTED_TEXT),
            Err(ApiError::Status(_)) => (false, CONNECTION_FAILED_TEXT),
            Err(_) => (false, UNREACHABLE_TEXT),
        };

        let kind = if ok {
            MessageKind::Success
        } else {
            MessageKind::Error
        };
        self.show_message(text, kind);
        ok
    }
}

/// Lock a mutex, recovering the data if another thread panicked with it held.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// A running dashboard: the shared state plus its auto-refresh timer.
pub struct App<A: BinApi + 'static> {
    dashboard: Arc<Dashboard<A>>,
    scheduler: Scheduler,
}

impl<A: BinApi + 'static> App<A> {
    /// Load once, then refresh every `interval` until [`dispose`](Self::dispose).
    pub fn init(dashboard: Arc<Dashboard<A>>, interval: Duration) -> Self {
        // The first load reports failure through the status message.
        let _ = dashboard.load_all();

        let ticking = Arc::clone(&dashboard);
        let scheduler = Scheduler::start(interval, move || {
            let _ = ticking.load_all();
        });

        Self {
            dashboard,
            scheduler,
        }
    }

    pub fn dashboard(&self) -> &Arc<Dashboard<A>> {
        &self.dashboard
    }

    /// Stop the auto-refresh timer.
    pub fn dispose(mut self) {
        self.scheduler.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Statistics;

    /// Fake backend with fixed answers.
    #[derive(Default)]
    struct FakeApi {
        stats_fail: bool,
        bins: Option<Vec<BinReading>>,
    }

    impl BinApi for FakeApi {
        fn probe(&self, _: &str) -> Result<(), ApiError> {
            Ok(())
        }

        fn statistics(&self, _: &str) -> Result<Statistics, ApiError> {
            if self.stats_fail {
                return Err(ApiError::Status(500));
            }
            Ok(Statistics {
                total_bins: 1.0,
                average_fill_level: 20.0,
                bins_needing_attention: 0.0,
                total_readings: 4.0,
            })
        }

        fn bins(&self, _: &str) -> Result<Vec<BinReading>, ApiError> {
            self.bins
                .clone()
                .ok_or_else(|| ApiError::Transport("connection refused".to_string()))
        }

        fn history(&self, _: &str, _: &str, _: u32) -> Result<Vec<BinReading>, ApiError> {
            Err(ApiError::Status(404))
        }

        fn latest(&self, _: &str, _: &str) -> Result<BinReading, ApiError> {
            Err(ApiError::Status(404))
        }
    }

    fn dashboard(api: FakeApi) -> Dashboard<FakeApi> {
        Dashboard::new(
            api,
            ConfigStore::in_memory("http://bins:5000"),
            Diagnostics::disabled(),
        )
    }

    #[test]
    fn load_all_failure_shows_single_message() {
        let dash = dashboard(FakeApi {
            stats_fail: true,
            bins: None,
        });

        let err = dash.load_all().unwrap_err().to_string();
        assert!(err.contains("statistics"));
        assert!(err.contains("bins"));

        let status = dash.status().unwrap();
        assert_eq!(status.text, LOAD_ERROR_TEXT);
        assert_eq!(status.kind, MessageKind::Error);
    }

    #[test]
    fn each_load_takes_a_newer_generation() {
        let dash = dashboard(FakeApi {
            bins: Some(Vec::new()),
            ..FakeApi::default()
        });

        dash.load_all().unwrap();
        dash.load_bins().unwrap();

        let view = dash.view();
        assert_eq!(view.stats_generation(), 1);
        assert_eq!(view.bins_generation(), 2);
    }

    #[test]
    fn load_statistics_failure_is_silent() {
        let dash = dashboard(FakeApi {
            stats_fail: true,
            ..FakeApi::default()
        });

        assert!(dash.load_statistics().is_err());
        assert!(dash.status().is_none());
        assert_eq!(dash.view().stats, StatsPanel::default());
        assert_eq!(dash.view().stats_generation(), 1);
    }

    #[test]
    fn history_and_latest_failures_show_no_message() {
        let dash = dashboard(FakeApi::default());
        assert!(dash.load_bin_history("A1", 20).is_empty());
        assert!(dash.load_bin_latest("A1").is_none());
        assert!(dash.status().is_none());
    }

    #[test]
    fn message_ttl_is_configurable() {
        let dash = dashboard(FakeApi::default()).with_message_ttl(Duration::ZERO);
        dash.show_message("gone", MessageKind::Success);
        assert!(dash.status().is_none());
    }
}
