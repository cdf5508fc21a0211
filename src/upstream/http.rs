//! HTTP Chain Status Source
//!
//! Polls the indexing engine over HTTP: `GET {base}/status` lists the
//! chain ids being indexed, `GET {base}/status/{chain_id}` serves one
//! chain's observation.
//! Request timeouts live here, in the client, because the SWR cache never
//! cancels an in-flight fetch.

use crate::status::{ChainId, ChainObservation};
use crate::upstream::{ChainStatusSource, UpstreamError};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeSet;

/// Configuration for the HTTP chain status source
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the indexing engine (e.g. "http://localhost:42069")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:42069".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// Chain status source backed by the indexing engine's HTTP API
pub struct HttpChainSource {
    client: Client,
    config: UpstreamConfig,
}

impl HttpChainSource {
    pub fn new(config: UpstreamConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn status_url(&self, chain_id: ChainId) -> String {
        format!(
            "{}/status/{}",
            self.config.base_url.trim_end_matches('/'),
            chain_id
        )
    }
}

impl HttpChainSource {
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, UpstreamError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else if e.is_connect() {
                UpstreamError::Unavailable
            } else {
                UpstreamError::Request(e)
            }
        })?;

        if !response.status().is_success() {
            return Err(UpstreamError::Status(response.status()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UpstreamError::InvalidPayload(e.to_string()))
    }
}

#[async_trait]
impl ChainStatusSource for HttpChainSource {
    async fn indexed_chain_ids(&self) -> Result<BTreeSet<ChainId>, UpstreamError> {
        let url = format!("{}/status", self.config.base_url.trim_end_matches('/'));
        let ids: Vec<ChainId> = self.get_json(&url).await?;
        Ok(ids.into_iter().collect())
    }

    async fn observe(&self, chain_id: ChainId) -> Result<ChainObservation, UpstreamError> {
        self.get_json(&self.status_url(chain_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_url_tolerates_trailing_slash() {
        let source = HttpChainSource::new(UpstreamConfig {
            base_url: "http://localhost:42069/".to_string(),
            request_timeout_ms: 1000,
        });
        assert_eq!(source.status_url(1), "http://localhost:42069/status/1");
    }
}
