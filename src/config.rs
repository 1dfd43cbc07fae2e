//! Backend selection and credentials, resolved from the environment with
//! CLI flags taking precedence.

use std::env;
use std::fmt;

use thiserror::Error;

pub const DEFAULT_MISTRAL_MODEL: &str = "mistral-large-latest";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "codellama";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown backend type '{0}': use 'anthropic', 'ollama' or 'mistral'")]
    UnknownKind(String),

    #[error("{0} is not set in the environment")]
    MissingCredential(&'static str),
}

/// Which AI provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Anthropic,
    Mistral,
    Ollama,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Anthropic => "anthropic",
            BackendKind::Mistral => "mistral",
            BackendKind::Ollama => "ollama",
        }
    }

    /// Parse a backend kind from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" => Some(BackendKind::Anthropic),
            "mistral" => Some(BackendKind::Mistral),
            "ollama" => Some(BackendKind::Ollama),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CLI-level overrides for backend resolution. All optional; unset fields
/// fall through to environment variables, then to defaults.
#[derive(Debug, Clone, Default)]
pub struct BackendOverrides {
    pub kind: Option<String>,
    pub model: Option<String>,
    pub url: Option<String>,
}

/// Fully resolved backend configuration. Construction validates that the
/// selected provider has everything it needs, so a scan fails before any
/// file is read rather than on the first AI call.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Anthropic { api_key: String },
    Mistral { api_key: String, model: String },
    Ollama { base_url: String, model: String },
}

impl BackendConfig {
    /// Resolve from the process environment.
    pub fn from_env(overrides: &BackendOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |name| env::var(name).ok())
    }

    /// Resolve using an arbitrary variable source.
    pub fn from_lookup<F>(overrides: &BackendOverrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let kind_name = overrides
            .kind
            .clone()
            .or_else(|| lookup("AI_MODEL_TYPE"))
            .unwrap_or_else(|| "anthropic".to_string());
        let kind =
            BackendKind::parse(&kind_name).ok_or_else(|| ConfigError::UnknownKind(kind_name))?;

        match kind {
            BackendKind::Anthropic => {
                let api_key = lookup("ANTHROPIC_API_KEY")
                    .ok_or(ConfigError::MissingCredential("ANTHROPIC_API_KEY"))?;
                Ok(BackendConfig::Anthropic { api_key })
            }
            BackendKind::Mistral => {
                let api_key = lookup("MISTRAL_API_KEY")
                    .ok_or(ConfigError::MissingCredential("MISTRAL_API_KEY"))?;
                let model = overrides
                    .model
                    .clone()
                    .or_else(|| lookup("MISTRAL_MODEL"))
                    .unwrap_or_else(|| DEFAULT_MISTRAL_MODEL.to_string());
                Ok(BackendConfig::Mistral { api_key, model })
            }
            BackendKind::Ollama => {
                let base_url = overrides
                    .url
                    .clone()
                    .or_else(|| lookup("OLLAMA_URL"))
                    .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
                let model = overrides
                    .model
                    .clone()
                    .or_else(|| lookup("OLLAMA_MODEL"))
                    .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());
                Ok(BackendConfig::Ollama { base_url, model })
            }
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Anthropic { .. } => BackendKind::Anthropic,
            BackendConfig::Mistral { .. } => BackendKind::Mistral,
            BackendConfig::Ollama { .. } => BackendKind::Ollama,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolve(
        overrides: &BackendOverrides,
        env: &HashMap<String, String>,
    ) -> Result<BackendConfig, ConfigError> {
        BackendConfig::from_lookup(overrides, |name| env.get(name).cloned())
    }

    #[test]
    fn test_defaults_to_anthropic() {
        let env = env_of(&[("ANTHROPIC_API_KEY", "sk-test")]);
        let config = resolve(&BackendOverrides::default(), &env).unwrap();
        assert_eq!(config.kind(), BackendKind::Anthropic);
    }

    #[test]
    fn test_missing_anthropic_key_fails_fast() {
        let env = env_of(&[]);
        let err = resolve(&BackendOverrides::default(), &env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("ANTHROPIC_API_KEY")));
    }

    #[test]
    fn test_empty_credential_counts_as_missing() {
        let env = env_of(&[("ANTHROPIC_API_KEY", "")]);
        assert!(resolve(&BackendOverrides::default(), &env).is_err());
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let env = env_of(&[("AI_MODEL_TYPE", "openai")]);
        let err = resolve(&BackendOverrides::default(), &env).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKind(_)));
    }

    #[test]
    fn test_kind_parse_is_case_insensitive() {
        assert_eq!(BackendKind::parse("Mistral"), Some(BackendKind::Mistral));
        assert_eq!(BackendKind::parse("OLLAMA"), Some(BackendKind::Ollama));
        assert_eq!(BackendKind::parse("gpt"), None);
    }

    #[test]
    fn test_mistral_model_default_and_env() {
        let env = env_of(&[("AI_MODEL_TYPE", "mistral"), ("MISTRAL_API_KEY", "mk")]);
        match resolve(&BackendOverrides::default(), &env).unwrap() {
            BackendConfig::Mistral { model, .. } => assert_eq!(model, DEFAULT_MISTRAL_MODEL),
            other => panic!("unexpected config: {:?}", other),
        }

        let env = env_of(&[
            ("AI_MODEL_TYPE", "mistral"),
            ("MISTRAL_API_KEY", "mk"),
            ("MISTRAL_MODEL", "mistral-small"),
        ]);
        match resolve(&BackendOverrides::default(), &env).unwrap() {
            BackendConfig::Mistral { model, .. } => assert_eq!(model, "mistral-small"),
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn test_ollama_needs_no_credentials() {
        let env = env_of(&[("AI_MODEL_TYPE", "ollama")]);
        match resolve(&BackendOverrides::default(), &env).unwrap() {
            BackendConfig::Ollama { base_url, model } => {
                assert_eq!(base_url, DEFAULT_OLLAMA_URL);
                assert_eq!(model, DEFAULT_OLLAMA_MODEL);
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn test_cli_overrides_beat_environment() {
        let overrides = BackendOverrides {
            kind: Some("ollama".to_string()),
            model: Some("llama3".to_string()),
            url: Some("http://gpu-box:11434".to_string()),
        };
        let env = env_of(&[
            ("AI_MODEL_TYPE", "anthropic"),
            ("OLLAMA_MODEL", "codellama"),
            ("OLLAMA_URL", "http://localhost:11434"),
        ]);
        match resolve(&overrides, &env).unwrap() {
            BackendConfig::Ollama { base_url, model } => {
                assert_eq!(base_url, "http://gpu-box:11434");
                assert_eq!(model, "llama3");
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }
}
