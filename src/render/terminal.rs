//! Colored terminal layout for the dashboard view.

use std::time::Instant;

use colored::{ColoredString, Colorize};

use super::{BinCard, FillStatus};
use crate::api::BinReading;
use crate::view::{BinsRegion, MessageKind, StatsPanel, View};

/// Width of the fill bar in characters.
const BAR_WIDTH: usize = 20;

/// Render the whole view as printable text.
pub fn render_view(view: &View, server_url: &str, now: Instant) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "SmartBin Dashboard".bold().cyan()));
    out.push_str(&format!("{}\n", format!("Server: {server_url}").dimmed()));
    out.push_str(&format!("{}\n\n", "=".repeat(60)));

    out.push_str(&render_stats(&view.stats));
    out.push('\n');
    out.push_str(&render_bins(&view.bins));

    if let Some(message) = view.status_at(now) {
        let text = match message.kind {
            MessageKind::Success => format!("✓ {}", message.text).green(),
            MessageKind::Error => format!("✗ {}", message.text).red(),
        };
        out.push_str(&format!("\n{text}\n"));
    }

    out
}

/// The four summary fields on two lines.
pub fn render_stats(stats: &StatsPanel) -> String {
    format!(
        "  {} {:<10} {} {}\n  {} {:<10} {} {}\n",
        "Total bins:     ".bold(),
        stats.total_bins,
        "Avg fill level:".bold(),
        stats.average_fill_level,
        "Need attention: ".bold(),
        stats.bins_needing_attention,
        "Total readings:".bold(),
        stats.total_readings,
    )
}

/// The bins region: either its placeholder or one block per card.
pub fn render_bins(region: &BinsRegion) -> String {
    match region.placeholder() {
        Some(text) if matches!(region, BinsRegion::Error) => format!("  {}\n", text.red()),
        Some(text) => format!("  {}\n", text.yellow()),
        None => region.cards().iter().map(render_card).collect(),
    }
}

/// One card:
///
/// ```text
///   A1                               [FULL]
///   ██████████████████░░ 85.5%
///   Distance: 12.34 cm   Last Update: 1/1/2024, 12:00:00 AM
/// ```
pub fn render_card(card: &BinCard) -> String {
    format!(
        "  {:<32} [{}]\n  {} {}\n  {} {}   {} {}\n\n",
        card.device_id.bold(),
        status_badge(card.status),
        fill_bar(card.bar_percent()),
        card.fill_text,
        "Distance:".dimmed(),
        card.distance_text,
        "Last Update:".dimmed(),
        card.updated_text,
    )
}

/// Tabular history listing, newest first as the API returns it.
pub fn render_history(device_id: &str, readings: &[BinReading]) -> String {
    let mut out = format!("{}\n", format!("History for {device_id}").bold().cyan());
    out.push_str(&format!("{}\n", "=".repeat(60)));

    if readings.is_empty() {
        out.push_str(&format!("  {}\n", "No readings found.".yellow()));
        return out;
    }

    out.push_str(&format!(
        "  {:<26} {:>8} {:>12} Status\n",
        "Updated", "Fill", "Distance"
    ));
    out.push_str(&format!("  {}\n", "-".repeat(58)));

    for (i, reading) in readings.iter().enumerate() {
        let card = BinCard::from_reading(reading);
        let line = format!(
            "  {:<26} {:>8} {:>12} ",
            card.updated_text, card.fill_text, card.distance_text
        );
        let line = if i % 2 == 0 {
            line.normal()
        } else {
            line.dimmed()
        };
        out.push_str(&format!("{line}{}\n", status_badge(card.status)));
    }

    out
}

fn status_badge(status: FillStatus) -> ColoredString {
    match status {
        FillStatus::Full => status.label().red().bold(),
        FillStatus::Medium => status.label().yellow().bold(),
        FillStatus::Low => status.label().green().bold(),
    }
}

fn fill_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::render::{classify, fixed};
    use crate::view::{NO_BINS_TEXT, StatusMessage};

    fn card(fill: f64) -> BinCard {
        BinCard {
            device_id: "A1".to_string(),
            status: classify(fill),
            fill_level: fill,
            fill_text: format!("{}%", fixed(fill, 1)),
            distance_text: "12.34 cm".to_string(),
            updated_text: "1/1/2024, 12:00:00 AM".to_string(),
        }
    }

    #[test]
    fn fill_bar_scales_and_clamps() {
        assert_eq!(fill_bar(0.0), "░".repeat(BAR_WIDTH));
        assert_eq!(fill_bar(100.0), "█".repeat(BAR_WIDTH));
        assert_eq!(fill_bar(50.0).chars().filter(|&c| c == '█').count(), 10);
    }

    #[test]
    fn card_block_contains_fields() {
        let text = render_card(&card(85.5));
        assert!(text.contains("A1"));
        assert!(text.contains("FULL"));
        assert!(text.contains("85.5%"));
        assert!(text.contains("12.34 cm"));
    }

    #[test]
    fn empty_region_renders_placeholder() {
        let text = render_bins(&BinsRegion::Empty);
        assert!(text.contains(NO_BINS_TEXT));
        assert!(!text.contains("Distance:"));
    }

    #[test]
    fn view_includes_visible_status() {
        let mut view = View::default();
        view.show(StatusMessage::new(
            "Data refreshed",
            MessageKind::Success,
            Duration::from_secs(3),
        ));
        let now = Instant::now();
        assert!(render_view(&view, "http://x", now).contains("Data refreshed"));
        assert!(!render_view(&view, "http://x", now + Duration::from_secs(5)).contains("Data refreshed"));
    }

    #[test]
    fn history_handles_empty() {
        let text = render_history("A1", &[]);
        assert!(text.contains("No readings found."));
    }
}
