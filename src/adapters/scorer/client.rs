//! Chat-completions client for the scoring service.
//!
//! Every request asks for a JSON object at temperature 0, the lowest-variance
//! mode the service offers. There is no retry loop: a failed call is reported
//! to the caller, which decides what to skip.

use crate::utils::error::ScoringError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(
        api_key: impl Into<String>,
        api_base: &str,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ScoringError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends one system + user exchange and returns the raw message content.
    pub async fn complete_json(&self, system: &str, prompt: &str) -> Result<String, ScoringError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ScoringError::ServiceError {
                message: format!("status {}: {}", status.as_u16(), message),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if let Some(usage) = &chat.usage {
            tracing::debug!(
                "Scoring call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ScoringError::MalformedResponse {
                reason: "response has no message content".to_string(),
            })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ScoringError {
        if e.is_timeout() {
            ScoringError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if e.is_decode() {
            ScoringError::MalformedResponse {
                reason: format!("undecodable service response: {}", e),
            }
        } else {
            ScoringError::from(e)
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` fences some models wrap around JSON.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped)
        }
        None => text,
    }
}
