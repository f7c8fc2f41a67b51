//! Blocking client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Completion, FinishReason, RankingService, ServiceFailure};
use crate::config::FinderConfig;

// ─── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [PartOut<'a>; 1],
}

#[derive(Serialize)]
struct PartOut<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartIn>,
}

#[derive(Deserialize, Debug)]
struct PartIn {
    text: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

// ─── Client ─────────────────────────────────────────────────────────

pub struct GeminiClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn from_config(cfg: &FinderConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(cfg.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl RankingService for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<Completion, ServiceFailure> {
        if self.api_key.trim().is_empty() {
            return Err(ServiceFailure::Auth {
                message: "API key is not configured".to_string(),
            });
        }

        let body = GenerateRequest {
            contents: [Content { parts: [PartOut { text: prompt }] }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Calling ranking model");
        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(transport_failure)?;

        let status = response.status();
        let text = response.text().map_err(transport_failure)?;
        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &text));
        }
        parse_generate_response(&text)
    }
}

fn transport_failure(e: reqwest::Error) -> ServiceFailure {
    if e.is_timeout() || e.is_connect() {
        ServiceFailure::Unavailable {
            status: None,
            message: e.to_string(),
        }
    } else {
        ServiceFailure::InvalidResponse {
            message: "transport error".to_string(),
            source: Some(Box::new(e)),
        }
    }
}

/// Classify a non-success reply, preferring the provider's status string
/// when the HTTP code alone is ambiguous.
pub(crate) fn classify_error(status: u16, body: &str) -> ServiceFailure {
    let (message, provider_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => (env.error.message, env.error.status),
        Err(_) => (body.chars().take(200).collect(), String::new()),
    };
    match provider_status.as_str() {
        "RESOURCE_EXHAUSTED" => ServiceFailure::RateLimited { message },
        "UNAVAILABLE" => ServiceFailure::Unavailable { status: Some(status), message },
        "PERMISSION_DENIED" | "UNAUTHENTICATED" => ServiceFailure::Auth { message },
        _ => ServiceFailure::from_status(status, message),
    }
}

/// Decode a success body into a [`Completion`]. Part texts of the first
/// candidate are concatenated.
pub(crate) fn parse_generate_response(body: &str) -> Result<Completion, ServiceFailure> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ServiceFailure::InvalidResponse {
            message: "response body is not a generateContent reply".to_string(),
            source: Some(Box::new(e)),
        })?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!(" (prompt blocked: {r})"))
            .unwrap_or_default();
        return Err(ServiceFailure::InvalidResponse {
            message: format!("response has no candidates{reason}"),
            source: None,
        });
    };

    let text = candidate.content.map(|c| {
        c.parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<String>()
    });
    Ok(Completion {
        text,
        finish_reason: candidate.finish_reason.as_deref().map(FinishReason::parse),
    })
}
