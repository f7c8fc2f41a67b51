//! Contract with the external ranking model.
//!
//! A [`RankingService`] makes exactly one request per call and reports the
//! outcome as data: a [`Completion`] on success, or a classified
//! [`ServiceFailure`] whose [`is_transient`](ServiceFailure::is_transient)
//! decides whether the orchestrator retries.

pub mod gemini;

pub use gemini::GeminiClient;

use thiserror::Error;

use crate::error::FinderError;

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Normal completion.
    Stop,
    MaxTokens,
    Safety,
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "SAFETY" => FinishReason::Safety,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FinishReason::Stop => "STOP".to_string(),
            FinishReason::MaxTokens => "MAX_TOKENS (output token limit reached)".to_string(),
            FinishReason::Safety => "SAFETY (blocked by safety filter)".to_string(),
            FinishReason::Other(raw) => raw.clone(),
        }
    }
}

/// One answer from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: Option<String>,
    /// `None` when the provider sent no terminal signal.
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    pub fn stop(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            finish_reason: Some(FinishReason::Stop),
        }
    }
}

/// Classified failure of a single request.
#[derive(Error, Debug)]
pub enum ServiceFailure {
    /// HTTP 429 / RESOURCE_EXHAUSTED
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    /// 5xx, connection refused, timeout
    #[error("service unavailable{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Unavailable { status: Option<u16>, message: String },

    /// Missing or rejected credential
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The request itself was rejected
    #[error("request rejected (HTTP {status}): {message}")]
    BadRequest { status: u16, message: String },

    /// The reply could not be decoded
    #[error("unexpected response: {message}")]
    InvalidResponse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ServiceFailure {
    /// Rate limiting and unavailability are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceFailure::RateLimited { .. } | ServiceFailure::Unavailable { .. })
    }

    /// Classify an HTTP error status plus whatever the body said.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => ServiceFailure::RateLimited { message },
            401 | 403 => ServiceFailure::Auth { message },
            500..=599 => ServiceFailure::Unavailable { status: Some(status), message },
            _ => ServiceFailure::BadRequest { status, message },
        }
    }
}

impl From<ServiceFailure> for FinderError {
    fn from(failure: ServiceFailure) -> Self {
        match failure {
            ServiceFailure::Auth { .. } => FinderError::ServiceAuth {
                message: failure.to_string(),
            },
            ServiceFailure::RateLimited { .. } | ServiceFailure::Unavailable { .. } => {
                FinderError::ServiceTransient {
                    attempts: 1,
                    message: failure.to_string(),
                }
            }
            ServiceFailure::BadRequest { .. } => FinderError::permanent(failure.to_string()),
            ServiceFailure::InvalidResponse { .. } => {
                let message = failure.to_string();
                FinderError::ServicePermanent {
                    message,
                    source: Some(Box::new(failure)),
                }
            }
        }
    }
}

/// Ranks catalog paths for a prompt. One call is one request.
pub trait RankingService: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<Completion, ServiceFailure>;
}
