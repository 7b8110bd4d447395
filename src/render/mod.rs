//! Turning API values into display values.
//!
//! Everything here is pure: fill-level classification, number and timestamp
//! formatting, and the [`BinCard`] display model. The [`terminal`] and
//! [`html`] submodules lay those values out for their front end.

pub mod html;
pub mod terminal;

use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::api::BinReading;

/// Fill level at or above which a bin counts as full.
pub const FULL_THRESHOLD: f64 = 80.0;

/// Fill level at or above which a bin counts as half full.
pub const MEDIUM_THRESHOLD: f64 = 50.0;

/// Text shown for a timestamp that cannot be parsed.
pub const INVALID_DATE: &str = "Invalid Date";

/// Date/time layout used for card timestamps (`1/1/2024, 12:00:00 AM`).
const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// Layouts accepted for timestamps without an offset, read as local time.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Fill tier of a bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStatus {
    Low,
    Medium,
    Full,
}

impl FillStatus {
    /// CSS-style class name.
    pub fn class(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Full => "full",
        }
    }

    /// User-facing badge text.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "OK",
            Self::Medium => "MEDIUM",
            Self::Full => "FULL",
        }
    }
}

impl fmt::Display for FillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a fill level. Thresholds are inclusive of the higher tier; NaN
/// compares false everywhere and lands in [`FillStatus::Low`].
pub fn classify(fill_level: f64) -> FillStatus {
    if fill_level >= FULL_THRESHOLD {
        FillStatus::Full
    } else if fill_level >= MEDIUM_THRESHOLD {
        FillStatus::Medium
    } else {
        FillStatus::Low
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Display model of one bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinCard {
    pub device_id: String,
    pub status: FillStatus,
    /// Raw fill level, used for bar widths.
    pub fill_level: f64,
    /// e.g. `85.5%`
    pub fill_text: String,
    /// e.g. `12.34 cm`
    pub distance_text: String,
    pub updated_text: String,
}

impl BinCard {
    pub fn from_reading(reading: &BinReading) -> Self {
        Self::from_reading_in(reading, &Local)
    }

    /// Like [`from_reading`](Self::from_reading) with timestamps shown in `tz`.
    pub fn from_reading_in<Tz: TimeZone>(reading: &BinReading, tz: &Tz) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self {
            device_id: reading.device_id.clone(),
            status: classify(reading.fill_level),
            fill_level: reading.fill_level,
            fill_text: format!("{}%", fixed(reading.fill_level, 1)),
            distance_text: format!("{} cm", fixed(reading.distance, 2)),
            updated_text: format_timestamp_in(reading.reported_at(), tz),
        }
    }

    /// Fill level clamped to `0..=100` for drawing; NaN draws as empty.
    pub fn bar_percent(&self) -> f64 {
        if self.fill_level.is_nan() {
            0.0
        } else {
            self.fill_level.clamp(0.0, 100.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Number formatting
// ---------------------------------------------------------------------------

/// Format with a fixed number of decimals. Non-finite values keep their
/// names (`NaN`, `Infinity`).
pub fn fixed(value: f64, decimals: usize) -> String {
    match non_finite(value) {
        Some(name) => name.to_string(),
        None => format!("{value:.decimals$}"),
    }
}

/// Format a statistics value in its shortest form (`3`, `42.1`).
pub fn format_stat(value: f64) -> String {
    match non_finite(value) {
        Some(name) => name.to_string(),
        None if value == 0.0 => "0".to_string(),
        None => value.to_string(),
    }
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("Infinity")
    } else if value == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Timestamp formatting
// ---------------------------------------------------------------------------

/// Format a reading timestamp in local time.
pub fn format_timestamp(raw: Option<&str>) -> String {
    format_timestamp_in(raw, &Local)
}

/// Format a reading timestamp in `tz`.
///
/// Offset-carrying timestamps are converted; bare date-times are taken as
/// already being in `tz`; a bare date is midnight UTC.
pub fn format_timestamp_in<Tz: TimeZone>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    raw.and_then(|s| parse_timestamp(s.trim(), tz))
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz));
    }

    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return tz.from_local_datetime(&naive).earliest();
    }

    let midnight = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).with_timezone(tz))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(fill: f64, distance: f64, timestamp: Option<&str>) -> BinReading {
        BinReading {
            device_id: "A1".to_string(),
            fill_level: fill,
            distance,
            timestamp: timestamp.map(str::to_string),
            created_at: None,
        }
    }

    #[test]
    fn classify_tiers_and_boundaries() {
        assert_eq!(classify(0.0), FillStatus::Low);
        assert_eq!(classify(49.999), FillStatus::Low);
        assert_eq!(classify(50.0), FillStatus::Medium);
        assert_eq!(classify(79.9), FillStatus::Medium);
        assert_eq!(classify(80.0), FillStatus::Full);
        assert_eq!(classify(100.0), FillStatus::Full);
        assert_eq!(classify(-5.0), FillStatus::Low);
        assert_eq!(classify(f64::NAN), FillStatus::Low);
    }

    #[test]
    fn class_and_label_pairs() {
        assert_eq!((FillStatus::Low.class(), FillStatus::Low.label()), ("low", "OK"));
        assert_eq!(
            (FillStatus::Medium.class(), FillStatus::Medium.label()),
            ("medium", "MEDIUM")
        );
        assert_eq!((FillStatus::Full.class(), FillStatus::Full.label()), ("full", "FULL"));
    }

    #[test]
    fn card_formats_values() {
        let card = BinCard::from_reading_in(
            &reading(85.5, 12.34, Some("2024-01-01T00:00:00Z")),
            &Utc,
        );
        assert_eq!(card.status, FillStatus::Full);
        assert_eq!(card.fill_text, "85.5%");
        assert_eq!(card.distance_text, "12.34 cm");
        assert_eq!(card.updated_text, "1/1/2024, 12:00:00 AM");
    }

    #[test]
    fn card_shows_nan_for_garbage() {
        let card = BinCard::from_reading_in(&reading(f64::NAN, f64::NAN, None), &Utc);
        assert_eq!(card.status, FillStatus::Low);
        assert_eq!(card.fill_text, "NaN%");
        assert_eq!(card.distance_text, "NaN cm");
        assert_eq!(card.updated_text, INVALID_DATE);
        assert_eq!(card.bar_percent(), 0.0);
    }

    #[test]
    fn fixed_rounds() {
        assert_eq!(fixed(33.333, 1), "33.3");
        assert_eq!(fixed(7.0, 2), "7.00");
        assert_eq!(fixed(f64::INFINITY, 1), "Infinity");
    }

    #[test]
    fn format_stat_is_shortest_form() {
        assert_eq!(format_stat(3.0), "3");
        assert_eq!(format_stat(42.1), "42.1");
        assert_eq!(format_stat(0.0), "0");
        assert_eq!(format_stat(-0.0), "0");
        assert_eq!(format_stat(f64::NAN), "NaN");
    }

    #[test]
    fn timestamp_layouts() {
        assert_eq!(
            format_timestamp_in(Some("2024-06-15T13:05:09.123456"), &Utc),
            "6/15/2024, 1:05:09 PM"
        );
        assert_eq!(
            format_timestamp_in(Some("2024-06-15 13:05:09"), &Utc),
            "6/15/2024, 1:05:09 PM"
        );
        assert_eq!(
            format_timestamp_in(Some("2024-06-15T13:05:09+02:00"), &Utc),
            "6/15/2024, 11:05:09 AM"
        );
        assert_eq!(
            format_timestamp_in(Some("2024-06-15"), &Utc),
            "6/15/2024, 12:00:00 AM"
        );
        assert_eq!(format_timestamp_in(Some("yesterday"), &Utc), INVALID_DATE);
        assert_eq!(format_timestamp_in(None, &Utc), INVALID_DATE);
    }
}
