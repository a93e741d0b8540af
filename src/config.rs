//! Extraction settings.
//!
//! The library never reads the environment on its own: callers build an
//! [`ExtractorConfig`] (usually from [`ExtractorConfig::default`]) and pass it
//! to the extractor. [`ExtractorConfig::from_env`] exists for the binary.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BEDROCK_MODEL: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost";
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Bedrock,
    Ollama,
    OpenAI,
}

impl BackendKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::Bedrock => DEFAULT_BEDROCK_MODEL,
            BackendKind::Ollama => DEFAULT_OLLAMA_MODEL,
            BackendKind::OpenAI => DEFAULT_OPENAI_MODEL,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Bedrock => write!(f, "bedrock"),
            BackendKind::Ollama => write!(f, "ollama"),
            BackendKind::OpenAI => write!(f, "openai"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bedrock" => Ok(BackendKind::Bedrock),
            "ollama" => Ok(BackendKind::Ollama),
            "openai" => Ok(BackendKind::OpenAI),
            other => Err(format!(
                "unknown backend {:?}, expected bedrock, ollama or openai",
                other
            )),
        }
    }
}

/// Model and decoding settings fixed for the lifetime of an extractor.
#[derive(Clone, PartialEq)]
pub struct ExtractorConfig {
    pub backend: BackendKind,
    pub model_id: String,
    /// AWS region; ignored by the non-Bedrock backends.
    pub region: String,
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Deadline for one remote call, after which the call fails with a timeout.
    pub request_timeout: Duration,
    pub ollama_host: String,
    pub ollama_port: u16,
    /// Falls back to `OPENAI_API_KEY` when unset.
    pub openai_api_key: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Bedrock,
            model_id: DEFAULT_BEDROCK_MODEL.to_string(),
            region: DEFAULT_REGION.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: DEFAULT_TIMEOUT,
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            ollama_port: DEFAULT_OLLAMA_PORT,
            openai_api_key: None,
        }
    }
}

impl fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("backend", &self.backend)
            .field("model_id", &self.model_id)
            .field("region", &self.region)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("ollama_host", &self.ollama_host)
            .field("ollama_port", &self.ollama_port)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ExtractorConfig {
    /// Switch backend, resetting the model to that backend's default.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self.model_id = backend.default_model().to_string();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::Empty { field: "model_id" });
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::Empty { field: "region" });
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ConfigError::Invalid {
                field: "temperature",
                reason: format!("must be a non-negative number, got {}", self.temperature),
            });
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "max_tokens",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "request_timeout",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Defaults overlaid with `LLM_BACKEND`, `LLM_MODEL`, `AWS_REGION_NAME`,
    /// `LLM_TEMPERATURE`, `LLM_MAX_TOKENS`, `LLM_TIMEOUT_SECS`, `OLLAMA_HOST`,
    /// `OLLAMA_PORT` and `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = match get("LLM_BACKEND") {
            Some(value) => {
                let backend: BackendKind = value.parse().map_err(|reason| ConfigError::Invalid {
                    field: "LLM_BACKEND",
                    reason,
                })?;
                Self::default().with_backend(backend)
            }
            None => Self::default(),
        };

        if let Some(model) = get("LLM_MODEL") {
            config.model_id = model;
        }
        if let Some(region) = get("AWS_REGION_NAME") {
            config.region = region;
        }
        if let Some(value) = get("LLM_TEMPERATURE") {
            config.temperature = parse_var("LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = get("LLM_MAX_TOKENS") {
            config.max_tokens = parse_var("LLM_MAX_TOKENS", &value)?;
        }
        if let Some(value) = get("LLM_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_var("LLM_TIMEOUT_SECS", &value)?);
        }
        if let Some(host) = get("OLLAMA_HOST") {
            config.ollama_host = host;
        }
        if let Some(value) = get("OLLAMA_PORT") {
            config.ollama_port = parse_var("OLLAMA_PORT", &value)?;
        }
        config.openai_api_key = get("OPENAI_API_KEY");

        Ok(config)
    }
}

fn parse_var<T>(field: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("{:?}: {}", value, e),
    })
}
