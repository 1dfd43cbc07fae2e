//! Anthropic messages API client. The one provider that retries on rate
//! limits, since hosted quotas are the common failure mode for large scans.

use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::runtime::Runtime;

use super::{
    render_prompt, retry_rate_limited, AiBackend, BackendError, SYSTEM_PROMPT,
};
use crate::lang::Language;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-3-haiku-20240307";
const MAX_TOKENS: u32 = 1024;

/// Calls made per snippet before giving up on a rate-limited provider.
pub const MAX_RATE_LIMIT_ATTEMPTS: u32 = 5;

pub struct AnthropicBackend {
    http: Client,
    runtime: Runtime,
    api_key: String,
}

impl AnthropicBackend {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            http: super::http_client()?,
            runtime: super::runtime()?,
            api_key,
        })
    }
}

impl AiBackend for AnthropicBackend {
    fn analyze(
        &self,
        template: &str,
        language: Language,
        code: &str,
        extra_context: &str,
    ) -> Result<String, BackendError> {
        let prompt = render_prompt(template, language, code, extra_context);
        self.runtime.block_on(retry_rate_limited(
            MAX_RATE_LIMIT_ATTEMPTS,
            || request(&self.http, &self.api_key, &prompt),
        ))
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

async fn request(client: &Client, api_key: &str, prompt: &str) -> Result<String, BackendError> {
    let payload = json!({
        "model": MODEL,
        "max_tokens": MAX_TOKENS,
        "temperature": 0,
        "system": SYSTEM_PROMPT,
        "messages": [{"role": "user", "content": prompt}],
    });

    let response = client
        .post(API_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION)
        .json(&payload)
        .send()
        .await?;

    match response.status().as_u16() {
        200 => {}
        429 => return Err(BackendError::RateLimited),
        status => return Err(BackendError::Status(status)),
    }

    let body: MessagesResponse = response
        .json()
        .await
        .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
    let text = body
        .content
        .first()
        .and_then(|block| block.text.clone())
        .ok_or_else(|| BackendError::MalformedResponse("no text content block".to_string()))?;
    if text.trim().is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    debug!("anthropic answered with {} bytes", text.len());
    Ok(text)
}
