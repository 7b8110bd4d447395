//! Embedded web dashboard.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard that polls the view snapshot
//! - JSON endpoints for manual refresh, connection test, URL change and
//!   bin history
//!
//! Launched via `smartbin web` (default: `http://127.0.0.1:9747`). The
//! dashboard keeps refreshing from the backend on its own timer; the page
//! only renders what the dashboard currently holds.

mod api;
mod frontend;

use std::io::{Cursor, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::api::BinApi;
use crate::dashboard::Dashboard;

type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Serve the dashboard on `addr`. Blocks the current thread.
///
/// Requests are handled sequentially; a failing handler answers 500 and an
/// unreadable body answers 400, without stopping the server.
pub fn serve<A: BinApi>(addr: &str, dashboard: Arc<Dashboard<A>>) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("smartbin dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = read_body(&method, request.as_reader());
        let response = respond(&dashboard, &method, &url, body);
        let _ = request.respond(response);

        println!(
            "{} {} {}",
            method,
            url,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Read the request body for methods that carry one.
fn read_body(method: &Method, reader: &mut dyn Read) -> std::io::Result<Option<String>> {
    if !matches!(method, Method::Put | Method::Post) {
        return Ok(None);
    }
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    Ok(Some(buf))
}

/// Turn a request into a response, whatever the outcome.
fn respond<A: BinApi>(
    dashboard: &Dashboard<A>,
    method: &Method,
    url: &str,
    body: std::io::Result<Option<String>>,
) -> HttpResponse {
    let body = match body {
        Ok(body) => body,
        Err(e) => return error_response(400, &format!("could not read request body: {e}")),
    };
    dispatch(dashboard, method, url, body.as_deref())
        .unwrap_or_else(|e| error_response(500, &e.to_string()))
}

/// Dispatch an incoming request to the appropriate handler.
fn dispatch<A: BinApi>(
    dashboard: &Dashboard<A>,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<HttpResponse> {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        (&Method::Get, "/api/view") => api::get_view(dashboard),
        (&Method::Post, "/api/refresh") => api::post_refresh(dashboard),
        (&Method::Post, "/api/test-connection") => api::post_test_connection(dashboard),
        (&Method::Put, "/api/server-url") => api::put_server_url(dashboard, body.unwrap_or("{}")),

        (&Method::Get, p) if p.starts_with("/api/history/") => {
            let device_id = &p["/api/history/".len()..];
            api::get_history(dashboard, device_id, url)
        }

        _ => Ok(error_response(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn serve_frontend() -> HttpResponse {
    let resp = Response::from_data(frontend::INDEX_HTML.as_bytes().to_vec())
        .with_status_code(StatusCode(200));
    with_content_type(resp, "text/html; charset=utf-8")
}

fn error_response(code: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    let resp = Response::from_data(body.into_bytes()).with_status_code(StatusCode(code));
    with_content_type(resp, "application/json; charset=utf-8")
}

/// Build a JSON response with the given status.
pub(crate) fn json_response<T: serde::Serialize>(code: u16, data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    let resp = Response::from_data(body.into_bytes()).with_status_code(StatusCode(code));
    Ok(with_content_type(resp, "application/json; charset=utf-8"))
}

fn with_content_type(resp: HttpResponse, value: &str) -> HttpResponse {
    match Header::from_bytes("Content-Type", value) {
        Ok(header) => resp.with_header(header),
        Err(()) => resp,
    }
}
