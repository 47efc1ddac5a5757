//! HTTP client for the Ficsit Remote Monitoring web server
//!
//! Each endpoint returns a JSON array with one entry per entity. A failed
//! request or undecodable body is a `RetrievalError`; callers skip the cycle.

use crate::infra::config::Config;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const TRAINS_ENDPOINT: &str = "/getTrains";
pub const VEHICLES_ENDPOINT: &str = "/getVehicles";
pub const PRODUCTION_ENDPOINT: &str = "/getProdStats";

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Produces one snapshot of entity records per call
#[async_trait]
pub trait SnapshotSource<R>: Send + Sync {
    async fn fetch(&self) -> Result<Vec<R>, RetrievalError>;
}

pub struct FrmClient {
    client: reqwest::Client,
    address: String,
}

impl FrmClient {
    pub fn new(address: &str, timeout: Duration) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self { client, address: address.trim_end_matches('/').to_string() })
    }

    pub fn from_config(config: &Config) -> Result<Self, RetrievalError> {
        Self::new(config.frm_address(), Duration::from_millis(config.frm_timeout_ms()))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.address, endpoint)
    }

    /// GET an endpoint and decode its JSON array
    pub async fn fetch<R: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<Vec<R>, RetrievalError> {
        let url = self.url(endpoint);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| RetrievalError::Transport { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status { url, status: status.as_u16() });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| RetrievalError::Transport { url: url.clone(), source })?;

        debug!(url = %url, bytes = body.len(), "frm_response_received");

        serde_json::from_slice(&body).map_err(|source| RetrievalError::Decode { url, source })
    }
}

/// One FRM endpoint bound to its record type
pub struct FrmSource<R> {
    client: Arc<FrmClient>,
    endpoint: &'static str,
    _record: PhantomData<fn() -> R>,
}

impl<R> FrmSource<R> {
    pub fn new(client: Arc<FrmClient>, endpoint: &'static str) -> Self {
        Self { client, endpoint, _record: PhantomData }
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }
}

#[async_trait]
impl<R> SnapshotSource<R> for FrmSource<R>
where
    R: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self) -> Result<Vec<R>, RetrievalError> {
        self.client.fetch(self.endpoint).await
    }
}
