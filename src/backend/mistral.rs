//! Mistral chat completions client. Single shot: transport and HTTP errors
//! surface directly to the caller.

use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::runtime::Runtime;

use super::{render_prompt, AiBackend, BackendError, SYSTEM_PROMPT};
use crate::lang::Language;

const API_URL: &str = "https://api.mistral.ai/v1/chat/completions";
const MAX_TOKENS: u32 = 1024;

pub struct MistralBackend {
    http: Client,
    runtime: Runtime,
    api_key: String,
    model: String,
}

impl MistralBackend {
    pub fn new(api_key: String, model: String) -> anyhow::Result<Self> {
        Ok(Self {
            http: super::http_client()?,
            runtime: super::runtime()?,
            api_key,
            model,
        })
    }
}

impl AiBackend for MistralBackend {
    fn analyze(
        &self,
        template: &str,
        language: Language,
        code: &str,
        extra_context: &str,
    ) -> Result<String, BackendError> {
        let prompt = render_prompt(template, language, code, extra_context);
        self.runtime
            .block_on(request(&self.http, &self.api_key, &self.model, &prompt))
    }

    fn name(&self) -> &'static str {
        "mistral"
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

async fn request(
    client: &Client,
    api_key: &str,
    model: &str,
    prompt: &str,
) -> Result<String, BackendError> {
    let payload = json!({
        "model": model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": prompt},
        ],
        "temperature": 0.0,
        "max_tokens": MAX_TOKENS,
    });

    let response = client
        .post(API_URL)
        .bearer_auth(api_key)
        .header("Accept", "application/json")
        .json(&payload)
        .send()
        .await?;

    match response.status().as_u16() {
        200 => {}
        429 => return Err(BackendError::RateLimited),
        status => return Err(BackendError::Status(status)),
    }

    let body: ChatResponse = response
        .json()
        .await
        .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
    let content = match body.choices.into_iter().next() {
        Some(choice) => choice.message.content,
        None => {
            return Err(BackendError::MalformedResponse(
                "unexpected response format from Mistral API".to_string(),
            ))
        }
    };
    if content.trim().is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    debug!("mistral answered with {} bytes", content.len());
    Ok(content)
}
