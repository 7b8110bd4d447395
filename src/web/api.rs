//! JSON handlers for the web dashboard.
//!
//! Each handler works on the shared [`Dashboard`] and returns a JSON response.
//! Backend failures are reported in the body (and through the dashboard's
//! status message), not as HTTP errors, so the page keeps polling.

use std::io::Cursor;

use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use tiny_http::Response;

use super::json_response;
use crate::api::{BinApi, BinReading};
use crate::config::schema::DEFAULT_HISTORY_LIMIT;
use crate::dashboard::Dashboard;
use crate::render::{BinCard, html};
use crate::view::{MessageKind, StatsPanel};

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

/// Snapshot of everything the page displays.
#[derive(Serialize)]
struct ViewResponse {
    server_url: String,
    stats: StatsPanel,
    bins_html: String,
    card_count: usize,
    status: Option<StatusResponse>,
}

#[derive(Serialize)]
struct StatusResponse {
    text: String,
    kind: MessageKind,
}

#[derive(Serialize)]
struct ActionResponse {
    success: bool,
    status: Option<StatusResponse>,
}

#[derive(Serialize)]
struct HistoryResponse {
    device_id: String,
    limit: u32,
    cards: Vec<BinCard>,
}

#[derive(Deserialize)]
struct ServerUrlRequest {
    url: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn current_status<A: BinApi>(dashboard: &Dashboard<A>) -> Option<StatusResponse> {
    dashboard.status().map(|m| StatusResponse {
        text: m.text,
        kind: m.kind,
    })
}

fn action_response<A: BinApi>(
    dashboard: &Dashboard<A>,
    success: bool,
) -> Result<Response<Cursor<Vec<u8>>>> {
    json_response(
        200,
        &ActionResponse {
            success,
            status: current_status(dashboard),
        },
    )
}

/// Parse the `?limit=N` query parameter from a URL.
fn parse_limit_param(url: &str) -> Option<u32> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == "limit" { v.parse().ok() } else { None }
    })
}

/// Decode a percent-encoded path segment. Invalid UTF-8 is replaced.
fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/view`: current view snapshot.
pub fn get_view<A: BinApi>(dashboard: &Dashboard<A>) -> Result<Response<Cursor<Vec<u8>>>> {
    let view = dashboard.view();
    let resp = ViewResponse {
        server_url: dashboard.server_url(),
        bins_html: html::render_bins(&view.bins),
        card_count: view.bins.cards().len(),
        stats: view.stats,
        status: current_status(dashboard),
    };
    json_response(200, &resp)
}

/// `POST /api/refresh`: manual refresh.
pub fn post_refresh<A: BinApi>(dashboard: &Dashboard<A>) -> Result<Response<Cursor<Vec<u8>>>> {
    let ok = dashboard.refresh();
    action_response(dashboard, ok)
}

/// `POST /api/test-connection`: probe the backend root.
pub fn post_test_connection<A: BinApi>(
    dashboard: &Dashboard<A>,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let ok = dashboard.test_connection();
    action_response(dashboard, ok)
}

/// `PUT /api/server-url`: change the backend URL.
///
/// Expects JSON body: `{ "url": "http://192.168.1.10:5000" }`
pub fn put_server_url<A: BinApi>(
    dashboard: &Dashboard<A>,
    body: &str,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let req: ServerUrlRequest =
        serde_json::from_str(body).context("invalid JSON in server URL request")?;
    let ok = dashboard.update_server_url(&req.url).is_ok();
    action_response(dashboard, ok)
}

/// `GET /api/history/{device_id}?limit=N`: recent readings as cards.
pub fn get_history<A: BinApi>(
    dashboard: &Dashboard<A>,
    raw_device_id: &str,
    url: &str,
) -> Result<Response<Cursor<Vec<u8>>>> {
    let device_id = decode_segment(raw_device_id);
    let limit = parse_limit_param(url).unwrap_or(DEFAULT_HISTORY_LIMIT);
    let readings: Vec<BinReading> = dashboard.load_bin_history(&device_id, limit);

    let resp = HistoryResponse {
        cards: readings.iter().map(BinCard::from_reading).collect(),
        device_id,
        limit,
    };
    json_response(200, &resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
