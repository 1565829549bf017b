use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::api::schema::{LiveRequest, LiveResponse, PreMatchRequest, PreMatchResponse};

/// The dashboard's call to the prediction API failed.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Endpoint the failed call targeted.
    pub fn url(&self) -> &str {
        match self {
            TransportError::Request { url, .. }
            | TransportError::Status { url, .. }
            | TransportError::Decode { url, .. } => url,
        }
    }
}

/// Client for the prediction API. One attempt per call, no retry.
#[derive(Clone)]
pub struct PredictionClient {
    http: Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(PredictionClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pre_match_url(&self) -> String {
        format!("{}/predict/pre_match", self.base_url)
    }

    pub fn live_wpa_url(&self) -> String {
        format!("{}/predict/live_wpa", self.base_url)
    }

    pub async fn predict_pre_match(
        &self,
        req: &PreMatchRequest,
    ) -> Result<PreMatchResponse, TransportError> {
        self.post(self.pre_match_url(), req).await
    }

    pub async fn predict_live_wpa(&self, req: &LiveRequest) -> Result<LiveResponse, TransportError> {
        self.post(self.live_wpa_url(), req).await
    }

    async fn post<B, T>(&self, url: String, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", url);
        let resp = match self.http.post(&url).json(body).send().await {
            Ok(r) => r,
            Err(source) => return Err(TransportError::Request { url, source }),
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let body = match resp.text().await {
                Ok(text) => text,
                Err(e) => format!("<failed to read response body: {}>", e),
            };
            return Err(TransportError::Status { url, status, body });
        }

        match resp.json::<T>().await {
            Ok(v) => Ok(v),
            Err(source) => Err(TransportError::Decode { url, source }),
        }
    }
}
