use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use skybook_dispatch::{
    BackendError, ChatAdvice, ChatRequest, FlightBackend, FlightOffer, FlightSearchRequest,
};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(20),
            connect_timeout: Duration::from_secs(6),
        }
    }
}

impl HttpBackendConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = env::var("SKYBOOK_API_URL").unwrap_or(defaults.base_url);
        let timeout = env::var("SKYBOOK_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            base_url,
            timeout,
            connect_timeout: defaults.connect_timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Talks to the booking backend's REST API:
/// `POST {base}/flights/search` and `POST {base}/chat`.
#[derive(Debug, Clone)]
pub struct HttpFlightBackend {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Wrapped { flights: Vec<FlightOffer> },
    Bare(Vec<FlightOffer>),
}

impl HttpFlightBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "backend request");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|err| BackendError::Malformed(err.to_string()))
    }
}

impl FlightBackend for HttpFlightBackend {
    async fn search_flights(
        &self,
        request: &FlightSearchRequest,
    ) -> Result<Vec<FlightOffer>, BackendError> {
        let response: SearchResponse = self.post_json("/flights/search", request).await?;
        Ok(match response {
            SearchResponse::Wrapped { flights } => flights,
            SearchResponse::Bare(flights) => flights,
        })
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatAdvice, BackendError> {
        self.post_json("/chat", request).await
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else if err.is_decode() {
        BackendError::Malformed(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let backend = HttpFlightBackend::new(
            HttpBackendConfig::default().with_base_url("http://example.test/api/"),
        )
        .unwrap();
        assert_eq!(backend.base_url(), "http://example.test/api");
    }
}
