//! AI backends: interchangeable providers that take a rendered prompt and
//! return the model's raw text answer.
//!
//! Providers differ in transport and auth; the contract is shared. Calls are
//! synchronous from the caller's point of view, each backend owns a small
//! runtime and blocks on its own requests.

mod anthropic;
mod mistral;
mod ollama;

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use log::{info, warn};
use rand::Rng;
use reqwest::Client;
use thiserror::Error;
use tokio::runtime::Runtime;

use crate::config::BackendConfig;
use crate::lang::Language;

pub use anthropic::AnthropicBackend;
pub use mistral::MistralBackend;
pub use ollama::OllamaBackend;

/// Errors surfaced by backend calls.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {0}")]
    Status(u16),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("empty response from provider")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("rate limit retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// A provider that can analyze a code snippet.
pub trait AiBackend: Send + Sync {
    /// Render `template` with the language and code, send it to the
    /// provider, and return the raw text answer.
    fn analyze(
        &self,
        template: &str,
        language: Language,
        code: &str,
        extra_context: &str,
    ) -> Result<String, BackendError>;

    /// Short provider name for logs and reports.
    fn name(&self) -> &'static str;
}

/// System message shared by every provider.
pub const SYSTEM_PROMPT: &str = "You are a code analyzer that responds ONLY with \
valid JSON on a single line, with no formatting or additional text.";

/// Substitute the template placeholders. Extra context rides along with the
/// code block so dependency hints land inside the same fence.
pub(crate) fn render_prompt(
    template: &str,
    language: Language,
    code: &str,
    extra_context: &str,
) -> String {
    let full_code = format!("{}{}", code, extra_context);
    template
        .replace("{language}", language.as_str())
        .replace("{code}", &full_code)
}

/// Build the configured backend.
pub fn build_backend(config: &BackendConfig) -> anyhow::Result<Box<dyn AiBackend>> {
    let backend: Box<dyn AiBackend> = match config {
        BackendConfig::Anthropic { api_key } => Box::new(AnthropicBackend::new(api_key.clone())?),
        BackendConfig::Mistral { api_key, model } => {
            Box::new(MistralBackend::new(api_key.clone(), model.clone())?)
        }
        BackendConfig::Ollama { base_url, model } => {
            Box::new(OllamaBackend::new(base_url.clone(), model.clone())?)
        }
    };
    info!("using {} backend for analysis", backend.name());
    Ok(backend)
}

pub(crate) fn http_client() -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(concat!("cnpjcheck/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to create HTTP client")
}

pub(crate) fn runtime() -> anyhow::Result<Runtime> {
    Runtime::new().context("failed to start async runtime")
}

/// Backoff for rate-limited calls: `2^attempt` seconds plus a uniform
/// fraction of a second, with the exponent capped.
pub(crate) fn rate_limit_backoff(attempt: u32) -> Duration {
    let base = 1u64 << attempt.min(6);
    Duration::from_secs_f64(base as f64 + rand::thread_rng().gen_range(0.0..1.0))
}

/// Run `call` until it succeeds or fails with something other than a rate
/// limit. At most `max_attempts` calls are made; each retry waits with
/// exponential backoff first.
pub(crate) async fn retry_rate_limited<F, Fut>(
    max_attempts: u32,
    mut call: F,
) -> Result<String, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, BackendError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Err(BackendError::RateLimited) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(BackendError::RetriesExhausted { attempts: attempt });
                }
                let delay = rate_limit_backoff(attempt);
                warn!(
                    "rate limited, waiting {:.1}s before attempt {} of {}",
                    delay.as_secs_f64(),
                    attempt + 1,
                    max_attempts
                );
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}
