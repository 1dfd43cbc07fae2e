//! Ollama client for local models. No auth, one generate call per snippet.

use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::runtime::Runtime;

use super::{render_prompt, AiBackend, BackendError, SYSTEM_PROMPT};
use crate::lang::Language;

pub struct OllamaBackend {
    http: Client,
    runtime: Runtime,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: String, model: String) -> anyhow::Result<Self> {
        Ok(Self {
            http: super::http_client()?,
            runtime: super::runtime()?,
            base_url,
            model,
        })
    }
}

impl AiBackend for OllamaBackend {
    fn analyze(
        &self,
        template: &str,
        language: Language,
        code: &str,
        extra_context: &str,
    ) -> Result<String, BackendError> {
        let prompt = render_prompt(template, language, code, extra_context);
        self.runtime
            .block_on(request(&self.http, &self.base_url, &self.model, &prompt))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

async fn request(
    client: &Client,
    base_url: &str,
    model: &str,
    prompt: &str,
) -> Result<String, BackendError> {
    let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
    let payload = json!({
        "model": model,
        "prompt": prompt,
        "system": SYSTEM_PROMPT,
        "stream": false,
    });

    let response = client.post(&url).json(&payload).send().await?;

    match response.status().as_u16() {
        200 => {}
        status => return Err(BackendError::Status(status)),
    }

    let body: GenerateResponse = response
        .json()
        .await
        .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
    let text = match body.response {
        Some(text) => text,
        None => {
            return Err(BackendError::MalformedResponse(
                "unexpected response format from Ollama".to_string(),
            ))
        }
    };
    if text.trim().is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    debug!("ollama answered with {} bytes", text.len());
    Ok(text)
}
