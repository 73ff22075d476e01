//! OpenAI-compatible chat completion client.
//!
//! One non-streaming `POST {base_url}/chat/completions` per call. The first
//! choice's message content is the result; anything else is an error.

use std::time::Duration;

use async_trait::async_trait;
use newsdesk_shared::{NewsdeskError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::CompletionService;

/// User-Agent string for completion requests.
const USER_AGENT: &str = concat!("Newsdesk/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Settings for [`OpenAiClient`].
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// API base, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token. May be empty; the service then rejects every call.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Chat completion client for OpenAI-compatible endpoints.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client from settings.
    pub fn new(settings: OpenAiSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| NewsdeskError::network(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/chat/completions",
            settings.base_url.trim_end_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key,
            model: settings.model,
        })
    }

    /// The model this client asks for.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NewsdeskError::network(format!("chat completion: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsdeskError::http_status("chat completion", status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| NewsdeskError::network(format!("chat completion: body read: {e}")))?;

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            NewsdeskError::parse(format!(
                "invalid completion response: {e} (got: {})",
                text.chars().take(200).collect::<String>()
            ))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| NewsdeskError::Completion("response contained no choices".into()))?
            .message
            .content
            .ok_or_else(|| NewsdeskError::Completion("first choice has no content".into()))?;

        debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content)
    }
}
