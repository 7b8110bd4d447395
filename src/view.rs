//! The dashboard's view binding.
//!
//! A [`View`] holds every region the dashboard displays: the four statistics
//! fields, the bins region and the transient status message. Loaders write
//! into it; renderers read a snapshot of it. Nothing else knows where a
//! value ends up on screen.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::api::{BinReading, Statistics};
use crate::render::{self, BinCard};

/// Placeholder shown when the backend knows no bins yet.
pub const NO_BINS_TEXT: &str = "No bins found. Waiting for data...";

/// Placeholder shown when the bins request failed.
pub const BINS_ERROR_TEXT: &str = "Error loading bins. Check server connection.";

/// Placeholder shown before the first bins response.
pub const LOADING_TEXT: &str = "Loading bins...";

/// Value shown in a statistics field that has never been loaded.
const UNSET_FIELD: &str = "-";

// ---------------------------------------------------------------------------
// Statistics panel
// ---------------------------------------------------------------------------

/// The four summary fields, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsPanel {
    pub total_bins: String,
    pub average_fill_level: String,
    pub bins_needing_attention: String,
    pub total_readings: String,
}

impl Default for StatsPanel {
    fn default() -> Self {
        Self {
            total_bins: UNSET_FIELD.to_string(),
            average_fill_level: UNSET_FIELD.to_string(),
            bins_needing_attention: UNSET_FIELD.to_string(),
            total_readings: UNSET_FIELD.to_string(),
        }
    }
}

impl From<&Statistics> for StatsPanel {
    fn from(stats: &Statistics) -> Self {
        Self {
            total_bins: render::format_stat(stats.total_bins),
            average_fill_level: format!("{}%", render::format_stat(stats.average_fill_level)),
            bins_needing_attention: render::format_stat(stats.bins_needing_attention),
            total_readings: render::format_stat(stats.total_readings),
        }
    }
}

// ---------------------------------------------------------------------------
// Bins region
// ---------------------------------------------------------------------------

/// Content of the bins region.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BinsRegion {
    #[default]
    Loading,
    Empty,
    Cards(Vec<BinCard>),
    Error,
}

impl BinsRegion {
    /// Build the region from a bins response, keeping the API's order.
    pub fn from_readings(readings: &[BinReading]) -> Self {
        if readings.is_empty() {
            Self::Empty
        } else {
            Self::Cards(readings.iter().map(BinCard::from_reading).collect())
        }
    }

    /// Placeholder text, if the region is not showing cards.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Loading => Some(LOADING_TEXT),
            Self::Empty => Some(NO_BINS_TEXT),
            Self::Error => Some(BINS_ERROR_TEXT),
            Self::Cards(_) => None,
        }
    }

    /// Cards currently shown (empty for placeholders).
    pub fn cards(&self) -> &[BinCard] {
        match self {
            Self::Cards(cards) => cards,
            _ => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// Status message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Success,
    Error,
}

/// A transient notice that hides itself after `ttl`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
    shown_at: Instant,
    ttl: Duration,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, kind: MessageKind, ttl: Duration) -> Self {
        Self {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.ttl
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Everything the dashboard shows.
///
/// Each data region remembers the refresh generation that last wrote it and
/// ignores writes from older generations, so a slow response from an earlier
/// refresh cannot overwrite a newer one.
#[derive(Debug, Clone, Default)]
pub struct View {
    pub stats: StatsPanel,
    pub bins: BinsRegion,
    status: Option<StatusMessage>,
    stats_generation: u64,
    bins_generation: u64,
}

impl View {
    /// Replace the statistics fields. Returns `false` if `generation` is stale.
    pub fn apply_stats(&mut self, generation: u64, panel: StatsPanel) -> bool {
        if generation <= self.stats_generation {
            return false;
        }
        self.stats_generation = generation;
        self.stats = panel;
        true
    }

    /// Record a failed statistics load at `generation` without touching the
    /// fields. Older loads that finish later are then rejected.
    pub fn skip_stats(&mut self, generation: u64) -> bool {
        if generation <= self.stats_generation {
            return false;
        }
        self.stats_generation = generation;
        true
    }

    /// Replace the bins region. Returns `false` if `generation` is stale.
    pub fn apply_bins(&mut self, generation: u64, region: BinsRegion) -> bool {
        if generation <= self.bins_generation {
            return false;
        }
        self.bins_generation = generation;
        self.bins = region;
        true
    }

    /// Show a message, replacing whatever message was showing.
    pub fn show(&mut self, message: StatusMessage) {
        self.status = Some(message);
    }

    /// The message still visible at `now`, if any.
    pub fn status_at(&self, now: Instant) -> Option<&StatusMessage> {
        self.status.as_ref().filter(|m| m.is_visible(now))
    }

    /// Generation of the last applied bins write.
    pub fn bins_generation(&self) -> u64 {
        self.bins_generation
    }

    /// Generation of the last applied statistics write.
    pub fn stats_generation(&self) -> u64 {
        self.stats_generation
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
