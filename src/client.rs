//! Typed HTTP client for the screening backend.
//!
//! All four endpoints share one [`reqwest::Client`] and the base URL from
//! [`ClientConfig`]. Short requests carry the configured request timeout;
//! the screening stream is left unbounded.

use std::io;
use std::sync::Arc;

use futures_util::{Stream, TryStreamExt};
use reqwest::Response;
use serde::Deserialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::models::{DecisionAck, DecisionRequest, ResultSet};
use crate::stream::{record_stream, StreamRecord};
use crate::{AppError, Result};

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// HTTP client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl BackendClient {
    /// Build a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the HTTP client cannot be built.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| AppError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self { http, config })
    }

    /// Configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET /health` and return the reported status string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` on network failure, non-success status,
    /// or an undecodable body.
    pub async fn health(&self) -> Result<String> {
        let response = self
            .http
            .get(self.config.endpoint("health"))
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("health check failed: {err}")))?;
        let body: HealthBody = ensure_success(response, "health check")?
            .json()
            .await
            .map_err(|err| AppError::Transport(format!("invalid health response: {err}")))?;
        Ok(body.status)
    }

    /// `POST /screen-stream` and return the decoded record stream.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the request cannot be sent or the
    /// backend rejects it with a non-success status.
    pub async fn open_stream(&self) -> Result<impl Stream<Item = Result<StreamRecord>> + Send> {
        let response = self
            .http
            .post(self.config.endpoint("screen-stream"))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to start screening: {err}")))?;
        let response = ensure_success(response, "failed to start screening")?;
        debug!(status = %response.status(), "screening stream opened");

        let chunks = response.bytes_stream().map_err(io::Error::other);
        Ok(record_stream(chunks, self.config.max_record_bytes))
    }

    /// `GET /results` and return the stored result set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` on network failure or non-success
    /// status, and `AppError::StreamDecode` for a malformed body.
    pub async fn fetch_results(&self) -> Result<ResultSet> {
        let response = self
            .http
            .get(self.config.endpoint("results"))
            .timeout(self.config.request_timeout())
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to fetch results: {err}")))?;
        let results: ResultSet = ensure_success(response, "failed to fetch results")?
            .json()
            .await
            .map_err(|err| AppError::StreamDecode(format!("invalid results body: {err}")))?;
        results.validate()?;
        Ok(results)
    }

    /// `POST /hr-decision` and return the backend acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` on network failure, non-success status,
    /// or an undecodable acknowledgement.
    pub async fn submit_decision(&self, request: &DecisionRequest) -> Result<DecisionAck> {
        let response = self
            .http
            .post(self.config.endpoint("hr-decision"))
            .timeout(self.config.request_timeout())
            .json(request)
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to submit hr decision: {err}")))?;
        ensure_success(response, "failed to submit hr decision")?
            .json()
            .await
            .map_err(|err| AppError::Transport(format!("invalid hr decision response: {err}")))
    }
}

/// Reject non-2xx responses with a transport error naming `context`.
fn ensure_success(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::Transport(format!("{context}: backend returned {status}")))
    }
}
