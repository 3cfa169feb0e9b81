//! The analysis backend boundary.
//!
//! Classification itself happens elsewhere: a single request carries the
//! normalised document text as `{ "email": <text> }` and the response is a
//! [`ClassificationResult`] or an error payload `{ "error": <message> }`.
//! This module owns the wire types, the [`AnalysisBackend`] seam and the
//! reqwest-based HTTP implementation.

use crate::config::TriageConfig;
use crate::error::TriageError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// The two categories the backend can assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// The email needs an action or a reply.
    #[serde(rename = "Produtivo", alias = "Productive")]
    Productive,
    /// The email needs no immediate action.
    #[serde(rename = "Improdutivo", alias = "Unproductive")]
    Unproductive,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Productive => "Productive",
            Category::Unproductive => "Unproductive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A finalized analysis result as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "categoria")]
    pub category: Category,

    #[serde(rename = "sugestao_resposta")]
    pub suggested_response: String,

    #[serde(rename = "proposito")]
    pub purpose: String,

    /// Productivity likelihood, expected in `[0, 1]` but never clamped.
    #[serde(rename = "probabilidade")]
    pub probability: f64,

    #[serde(rename = "justificativa_produtividade")]
    pub justification: String,
}

/// Request body sent to the backend.
#[derive(Debug, Serialize)]
struct AnalysisRequest<'a> {
    email: &'a str,
}

/// Error payload of a non-success response.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Anything that can classify a document.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<ClassificationResult, TriageError>;
}

/// [`AnalysisBackend`] speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAnalysisBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAnalysisBackend {
    pub fn new(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Build a backend from the configured URL and timeout.
    pub fn from_config(config: &TriageConfig) -> Result<Self, TriageError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TriageError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self::new(config.backend_url.clone(), client))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn analyze(&self, text: &str) -> Result<ClassificationResult, TriageError> {
        info!("Requesting analysis of {} bytes from {}", text.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalysisRequest { email: text })
            .send()
            .await
            .map_err(|e| {
                warn!("Analysis request failed: {e}");
                TriageError::backend(Some(e.to_string()))
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!("Reading analysis response failed: {e}");
            TriageError::backend(Some(e.to_string()))
        })?;

        interpret_response(status, &body)
    }
}

/// Turn a raw backend response into a result or a [`TriageError::BackendError`].
///
/// Non-success statuses surface the payload's `error` field verbatim, or
/// [`crate::error::GENERIC_BACKEND_ERROR`] when the field is missing or the
/// body is not JSON at all.
pub fn interpret_response(
    status: StatusCode,
    body: &[u8],
) -> Result<ClassificationResult, TriageError> {
    if !status.is_success() {
        let payload: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        warn!("Analysis backend returned HTTP {status}");
        return Err(TriageError::backend(payload.error));
    }

    let result: ClassificationResult = serde_json::from_slice(body).map_err(|e| {
        warn!("Analysis backend returned an invalid payload: {e}");
        TriageError::backend(Some(format!("Invalid response from server: {e}")))
    })?;
    debug!(
        "Classified as {} ({:.3})",
        result.category, result.probability
    );
    Ok(result)
}
