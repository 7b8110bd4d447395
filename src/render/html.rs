//! HTML fragments for the embedded web dashboard.
//!
//! Markup follows the `bin-card {class}` structure that the page stylesheet
//! expects. All text coming from the backend is escaped.

use super::BinCard;
use crate::view::BinsRegion;

/// Fragment for the bins grid: a placeholder block or the concatenated cards.
pub fn render_bins(region: &BinsRegion) -> String {
    match region.placeholder() {
        Some(text) => format!(r#"<div class="loading">{}</div>"#, escape(text)),
        None => region.cards().iter().map(render_card).collect(),
    }
}

/// Fragment for a single bin card.
pub fn render_card(card: &BinCard) -> String {
    let class = card.status.class();
    format!(
        r#"<div class="bin-card {class}">
  <div class="bin-header">
    <div class="bin-id">{id}</div>
    <div class="bin-status {class}">{label}</div>
  </div>
  <div class="fill-bar-container">
    <div class="fill-bar" style="width: {width}%">{fill}</div>
  </div>
  <div class="bin-details">
    <p><strong>Distance:</strong> {distance}</p>
    <p><strong>Last Update:</strong> {updated}</p>
  </div>
</div>
"#,
        id = escape(&card.device_id),
        label = card.status.label(),
        width = card.bar_percent(),
        fill = escape(&card.fill_text),
        distance = escape(&card.distance_text),
        updated = escape(&card.updated_text),
    )
}

/// Escape text for use inside element content and quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FillStatus;
    use crate::view::BINS_ERROR_TEXT;

    fn card(id: &str, status: FillStatus, fill: f64) -> BinCard {
        BinCard {
            device_id: id.to_string(),
            status,
            fill_level: fill,
            fill_text: format!("{fill:.1}%"),
            distance_text: "12.34 cm".to_string(),
            updated_text: "1/1/2024, 12:00:00 AM".to_string(),
        }
    }

    #[test]
    fn card_carries_class_and_label() {
        let html = render_card(&card("A1", FillStatus::Full, 85.5));
        assert!(html.contains(r#"class="bin-card full""#));
        assert!(html.contains(r#"<div class="bin-status full">FULL</div>"#));
        assert!(html.contains("width: 85.5%"));
        assert!(html.contains("85.5%</div>"));
        assert!(html.contains("12.34 cm"));
    }

    #[test]
    fn device_id_is_escaped() {
        let html = render_card(&card("<script>", FillStatus::Low, 1.0));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn error_region_is_single_placeholder() {
        let html = render_bins(&BinsRegion::Error);
        assert_eq!(html, format!(r#"<div class="loading">{BINS_ERROR_TEXT}</div>"#));
    }

    #[test]
    fn cards_keep_api_order() {
        let region = BinsRegion::Cards(vec![
            card("Z9", FillStatus::Low, 10.0),
            card("A1", FillStatus::Medium, 60.0),
        ]);
        let html = render_bins(&region);
        let z = html.find("Z9").unwrap();
        let a = html.find("A1").unwrap();
        assert!(z < a);
        assert_eq!(html.matches("bin-card ").count(), 2);
    }
}
