//! OpenAI-compatible chat-completions transport.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use tracing::debug;
use warden_config::ModelConfig;

use crate::error::TransportError;
use crate::transport::ModelTransport;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Wait used when a 429 carries no usable `Retry-After` seconds.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Transport for any endpoint speaking `POST {base_url}/chat/completions`.
pub struct ChatCompletionsTransport {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

impl ChatCompletionsTransport {
    /// Build a transport from the `[model]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &ModelConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("warden/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, system_prompt: &'a str, user_prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        }
    }
}

/// Classify a completed exchange. `None` means the body can be decoded.
fn status_error(
    status: StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> Option<TransportError> {
    if status.is_success() {
        return None;
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = retry_after
            .and_then(|secs| secs.trim().parse().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Some(TransportError::RateLimited { retry_after_secs });
    }
    Some(TransportError::Api {
        status: status.as_u16(),
        message: body.trim().to_string(),
    })
}

/// Pull the first choice's text out of a chat-completions body.
///
/// A `null` content is an empty reply, not a decode failure.
fn decode_reply(body: &str) -> Result<String, TransportError> {
    let data: ChatResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    data.choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| TransportError::Decode("response has no choices".to_string()))
}

impl ModelTransport for ChatCompletionsTransport {
    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, TransportError> {
        debug!(endpoint = %self.endpoint, model = %self.model, "sending chat completion");
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(system_prompt, user_prompt))
            .send()
            .await?;
        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await?;
        if let Some(err) = status_error(status, retry_after.as_deref(), &body) {
            debug!(%status, "chat completion rejected");
            return Err(err);
        }
        let reply = decode_reply(&body)?;
        debug!(reply_bytes = reply.len(), "chat completion received");
        Ok(reply)
    }
}
