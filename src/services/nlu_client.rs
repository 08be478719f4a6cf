//! src/services/nlu_client.rs
//!
//! Client for the external natural-language-understanding (NLU) service.
//!
//! The service receives the caller's raw JSON request text unchanged and
//! answers with an analysis document whose `metadata` object carries the
//! fields we persist. Authentication is HTTP Basic with the fixed username
//! `apikey` and the configured key as password.
//!
//! Calls are awaited on the runtime and bounded by a per-request timeout.
//! Nothing is retried; every failure is reported to the caller as [`NluError`].

use crate::models::metadata::{Author, Feed};
use async_trait::async_trait;
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Basic-auth username the NLU service expects alongside an API key.
const API_KEY_USERNAME: &str = "apikey";

/// Upper bound on how much of an error body is kept for diagnostics.
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Error)]
pub enum NluError {
    #[error("NLU request timed out")]
    Timeout,
    #[error("NLU request failed: {0}")]
    Network(String),
    #[error("NLU service answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("NLU response could not be decoded: {0}")]
    Decode(String),
}

pub type NluResult<T> = Result<T, NluError>;

/// Analysis document returned by the NLU service.
///
/// Only `metadata` is consumed; other sections (`language`, `usage`, ...) are
/// ignored. A reply without `metadata` does not decode.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnalysisResult {
    pub metadata: AnalysisMetadata,
}

/// The `metadata` section of an analysis document.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnalysisMetadata {
    pub title: Option<String>,
    /// ISO local date-time text, e.g. `2023-05-01T00:00:00`.
    pub publication_date: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub feeds: Vec<Feed>,
    #[serde(default)]
    pub authors: Vec<Author>,
}

/// Anything that can turn raw request text into an [`AnalysisResult`].
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    async fn analyze(&self, request_body: String) -> NluResult<AnalysisResult>;
}

/// reqwest-backed [`TextAnalyzer`] talking to a configured NLU endpoint.
#[derive(Clone)]
pub struct NluClient {
    client: Client,
    api_url: String,
    api_key: String,
}

// Custom Debug to keep the API key out of logs
impl std::fmt::Debug for NluClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NluClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl NluClient {
    /// Build a client for `api_url` that gives up on any single call after `timeout`.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> NluResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("metamatrix/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| NluError::Network(err.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl TextAnalyzer for NluClient {
    async fn analyze(&self, request_body: String) -> NluResult<AnalysisResult> {
        debug!(url = %self.api_url, bytes = request_body.len(), "calling NLU service");

        let response = self
            .client
            .post(&self.api_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .basic_auth(API_KEY_USERNAME, Some(&self.api_key))
            .body(request_body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_on_char_boundary(&mut body, MAX_ERROR_BODY_LEN);
            return Err(NluError::Status { status, body });
        }

        response.json::<AnalysisResult>().await.map_err(|err| {
            if err.is_timeout() {
                NluError::Timeout
            } else {
                NluError::Decode(err.to_string())
            }
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> NluError {
    if err.is_timeout() {
        NluError::Timeout
    } else {
        NluError::Network(err.to_string())
    }
}

fn truncate_on_char_boundary(text: &mut String, max_len: usize) {
    if text.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
