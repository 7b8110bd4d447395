//! SmartBin backend API: wire types and the client seam.
//!
//! The dashboard only ever reads from the backend. Every call takes the base
//! URL explicitly so that a URL change applies to the next request without
//! rebuilding the client, and requests already in flight keep the URL they
//! were issued with.

pub mod client;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub use client::HttpClient;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Aggregate statistics from `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(deserialize_with = "lenient_f64", default = "nan")]
    pub total_bins: f64,
    #[serde(deserialize_with = "lenient_f64", default = "nan")]
    pub average_fill_level: f64,
    #[serde(deserialize_with = "lenient_f64", default = "nan")]
    pub bins_needing_attention: f64,
    #[serde(deserialize_with = "lenient_f64", default = "nan")]
    pub total_readings: f64,
}

/// One sensor reading, as returned by the bins and history endpoints.
///
/// Devices report numbers either as JSON numbers or as strings; anything that
/// does not parse is kept as NaN rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinReading {
    pub device_id: String,
    #[serde(deserialize_with = "lenient_f64", default = "nan")]
    pub fill_level: f64,
    #[serde(deserialize_with = "lenient_f64", default = "nan")]
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl BinReading {
    /// The reading's update time, preferring the device timestamp over the
    /// server's insertion time.
    pub fn reported_at(&self) -> Option<&str> {
        [self.timestamp.as_deref(), self.created_at.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsEnvelope {
    pub statistics: Statistics,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BinsEnvelope {
    pub bins: Vec<BinReading>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryEnvelope {
    #[serde(default)]
    pub data: Vec<BinReading>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LatestEnvelope {
    pub data: BinReading,
}

fn nan() -> f64 {
    f64::NAN
}

/// Accept a JSON number, a numeric string, or anything else (as NaN).
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an API call did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-success status.
    Status(u16),
    /// The request never got an answer (DNS, refused, timeout, ...).
    Transport(String),
    /// The answer was not the expected JSON shape.
    Decode(String),
    /// The configured base URL cannot have API paths appended.
    InvalidUrl(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "server returned HTTP {code}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Decode(msg) => write!(f, "unexpected response body: {msg}"),
            Self::InvalidUrl(msg) => write!(f, "invalid server URL {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

// ---------------------------------------------------------------------------
// Client seam
// ---------------------------------------------------------------------------

/// Read access to the SmartBin backend.
///
/// Implemented by [`HttpClient`] for real use and by in-memory fakes in tests.
pub trait BinApi: Send + Sync {
    /// `GET {base}/`: succeeds on any 2xx.
    fn probe(&self, base: &str) -> Result<(), ApiError>;

    /// `GET {base}/api/stats`
    fn statistics(&self, base: &str) -> Result<Statistics, ApiError>;

    /// `GET {base}/api/bins`
    fn bins(&self, base: &str) -> Result<Vec<BinReading>, ApiError>;

    /// `GET {base}/api/bins/{device_id}?limit={limit}`
    fn history(&self, base: &str, device_id: &str, limit: u32)
    -> Result<Vec<BinReading>, ApiError>;

    /// `GET {base}/api/bins/{device_id}/latest`
    fn latest(&self, base: &str, device_id: &str) -> Result<BinReading, ApiError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
