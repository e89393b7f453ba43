use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::PoolStatsConfig;
use crate::error::{PoolStatsError, Result};

/// Pool-wide statistics endpoint
pub const POOL_CURRENT_ENDPOINT: &str = "/api/pool/current";

/// User list endpoint; first entry is the primary user
pub const USERS_ENDPOINT: &str = "/api/users";

/// Reachability endpoint, used only by the startup probe
pub const HEALTH_ENDPOINT: &str = "/api/health";

/// Transport seam for the snapshot builder and coordinator.
///
/// The production implementation is [`StatsFetcher`]; tests drive the
/// builder with scripted implementations instead of a live server.
#[async_trait]
pub trait StatsApi: Send + Sync {
    /// Issue one GET against a relative API path and parse the body as JSON.
    async fn get_json(&self, path: &str) -> Result<Value>;
}

/// HTTP fetcher for the ckstats API
///
/// Issues single timeout-bounded GET requests. Retry policy lives in the
/// coordinator's refresh schedule, never here.
pub struct StatsFetcher {
    client: Client,
    base_url: String,
}

impl StatsFetcher {
    /// Create a fetcher for the given base URL (`http://host:port`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PoolStatsError::InvalidConfiguration(e.to_string()))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { client, base_url })
    }

    /// Create a fetcher from a pool configuration
    pub fn from_config(config: &PoolStatsConfig) -> Result<Self> {
        Self::new(config.base_url(), config.request_timeout)
    }

    /// One-time reachability check; any 2xx response counts as healthy
    pub async fn probe_health(&self) -> Result<()> {
        let url = format!("{}{}", self.base_url, HEALTH_ENDPOINT);
        debug!("health probe: GET {}", url);

        let response = self.client.get(&url).send().await.map_err(classify)?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            Err(PoolStatsError::HttpStatus(status.as_u16()))
        }
    }
}

#[async_trait]
impl StatsApi for StatsFetcher {
    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(classify)?;
        let status = response.status();

        if !status.is_success() {
            return Err(PoolStatsError::HttpStatus(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| PoolStatsError::MalformedBody(e.to_string()))
    }
}

/// Map a transport error onto the client's error taxonomy
fn classify(err: reqwest::Error) -> PoolStatsError {
    if err.is_timeout() {
        PoolStatsError::Timeout
    } else if err.is_decode() {
        PoolStatsError::MalformedBody(err.to_string())
    } else {
        PoolStatsError::Unreachable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_get_json_parses_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/pool/current")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"runtime": 42, "users": 3}"#)
            .create_async()
            .await;

        let fetcher = StatsFetcher::new(server.url(), Duration::from_secs(5)).unwrap();
        let value = fetcher.get_json(POOL_CURRENT_ENDPOINT).await.unwrap();

        assert_eq!(value["runtime"], 42);
        assert_eq!(value["users"], 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_json_maps_http_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/pool/current")
            .with_status(503)
            .create_async()
            .await;

        let fetcher = StatsFetcher::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = fetcher.get_json(POOL_CURRENT_ENDPOINT).await.unwrap_err();

        assert!(matches!(err, PoolStatsError::HttpStatus(503)));
    }

    #[tokio::test]
    async fn test_get_json_rejects_non_json_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/users")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let fetcher = StatsFetcher::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = fetcher.get_json(USERS_ENDPOINT).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedBody);
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Port 1 on localhost is essentially never listening
        let fetcher =
            StatsFetcher::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = fetcher.get_json(POOL_CURRENT_ENDPOINT).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unreachable);
    }

    #[tokio::test]
    async fn test_probe_health_accepts_2xx() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/health")
            .with_status(204)
            .create_async()
            .await;

        let fetcher = StatsFetcher::new(server.url(), Duration::from_secs(5)).unwrap();
        assert!(fetcher.probe_health().await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_health_rejects_500() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/health")
            .with_status(500)
            .create_async()
            .await;

        let fetcher = StatsFetcher::new(server.url(), Duration::from_secs(5)).unwrap();
        let err = fetcher.probe_health().await.unwrap_err();
        assert!(matches!(err, PoolStatsError::HttpStatus(500)));
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let fetcher =
            StatsFetcher::new("http://localhost:5000/", Duration::from_secs(5)).unwrap();
        assert_eq!(fetcher.base_url, "http://localhost:5000");
    }
}
