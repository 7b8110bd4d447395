/// Blocking HTTP client for the SmartBin backend.
///
/// Built on a shared `ureq::Agent` so connections are pooled across the
/// scheduler thread and manual refreshes. Non-2xx answers surface as
/// [`ApiError::Status`], everything that never reached a response as
/// [`ApiError::Transport`].
use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use super::{
    ApiError, BinApi, BinReading, BinsEnvelope, HistoryEnvelope, LatestEnvelope, Statistics,
    StatsEnvelope,
};
use crate::config::schema::ServerConfig;

/// `ureq`-backed [`BinApi`] implementation.
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    /// Build a client from the `[server]` config section.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(Duration::from_millis(config.timeout_ms))
    }

    fn get(&self, url: &Url) -> Result<ureq::Response, ApiError> {
        self.agent
            .request_url("GET", url)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => ApiError::Status(code),
                ureq::Error::Transport(t) => ApiError::Transport(t.to_string()),
            })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        self.get(url)?
            .into_json()
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

impl BinApi for HttpClient {
    fn probe(&self, base: &str) -> Result<(), ApiError> {
        self.get(&endpoint(base, &[])?).map(|_| ())
    }

    fn statistics(&self, base: &str) -> Result<Statistics, ApiError> {
        let env: StatsEnvelope = self.get_json(&endpoint(base, &["api", "stats"])?)?;
        Ok(env.statistics)
    }

    fn bins(&self, base: &str) -> Result<Vec<BinReading>, ApiError> {
        let env: BinsEnvelope = self.get_json(&endpoint(base, &["api", "bins"])?)?;
        Ok(env.bins)
    }

    fn history(
        &self,
        base: &str,
        device_id: &str,
        limit: u32,
    ) -> Result<Vec<BinReading>, ApiError> {
        let mut url = endpoint(base, &["api", "bins", device_id])?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let env: HistoryEnvelope = self.get_json(&url)?;
        Ok(env.data)
    }

    fn latest(&self, base: &str, device_id: &str) -> Result<BinReading, ApiError> {
        let env: LatestEnvelope =
            self.get_json(&endpoint(base, &["api", "bins", device_id, "latest"])?)?;
        Ok(env.data)
    }
}

/// Append path segments to the base URL. Each segment is percent-encoded on
/// its own, so a device id can never add or change path components.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let base = base.trim();
    let mut url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::InvalidUrl(format!("{base}: not a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_trailing_slash() {
        assert_eq!(
            endpoint("http://localhost:5000/", &["api", "stats"]).unwrap().as_str(),
            "http://localhost:5000/api/stats"
        );
        assert_eq!(
            endpoint("http://localhost:5000", &[]).unwrap().as_str(),
            "http://localhost:5000/"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        assert_eq!(
            endpoint("http://bins.local/smartbin", &["api", "bins"])
                .unwrap()
                .as_str(),
            "http://bins.local/smartbin/api/bins"
        );
    }

    #[test]
    fn endpoint_escapes_device_id_as_one_segment() {
        let url = endpoint("http://localhost:5000", &["api", "bins", "bin 7/a?"]).unwrap();
        assert_eq!(url.path(), "/api/bins/bin%207%2Fa%3F");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn endpoint_rejects_unusable_base() {
        assert!(matches!(
            endpoint("localhost:5000", &["api"]),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            endpoint("not a url", &[]),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        let client = HttpClient::new(Duration::from_millis(500));
        // Port 9 (discard) on loopback is closed on any sane test host.
        match client.probe("http://127.0.0.1:9") {
            Err(ApiError::Transport(_)) => {}
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
