//! Remote completion backends.
//!
//! The extraction pipeline only needs "prompt in, text out"; everything
//! provider-specific lives behind [`CompletionBackend`].

mod bedrock;
mod ollama;
mod openai;
mod replay;

pub use bedrock::BedrockBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAIBackend;
pub use replay::ReplayBackend;

use async_trait::async_trait;
use tracing::info;

use crate::config::{BackendKind, ExtractorConfig};
use crate::error::RemoteServiceError;
use crate::TARGET_LLM_REQUEST;

/// Everything a backend needs for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub region: String,
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Send one prompt and wait for the raw reply text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, RemoteServiceError>;
}

#[derive(Debug)]
pub enum LLMClient {
    Bedrock(BedrockBackend),
    Ollama(OllamaBackend),
    OpenAI(OpenAIBackend),
    Replay(ReplayBackend),
}

impl LLMClient {
    /// Build the live backend selected by `config.backend`.
    pub async fn from_config(config: &ExtractorConfig) -> Self {
        match config.backend {
            BackendKind::Bedrock => {
                info!(target: TARGET_LLM_REQUEST, "Using Bedrock in region {}", config.region);
                LLMClient::Bedrock(BedrockBackend::new(&config.region).await)
            }
            BackendKind::Ollama => {
                info!(
                    target: TARGET_LLM_REQUEST,
                    "Connecting to Ollama at {}:{}", config.ollama_host, config.ollama_port
                );
                LLMClient::Ollama(OllamaBackend::new(&config.ollama_host, config.ollama_port))
            }
            BackendKind::OpenAI => {
                info!(target: TARGET_LLM_REQUEST, "Using OpenAI API");
                LLMClient::OpenAI(OpenAIBackend::new(config.openai_api_key.clone()))
            }
        }
    }
}

#[async_trait]
impl CompletionBackend for LLMClient {
    fn name(&self) -> &str {
        match self {
            LLMClient::Bedrock(backend) => backend.name(),
            LLMClient::Ollama(backend) => backend.name(),
            LLMClient::OpenAI(backend) => backend.name(),
            LLMClient::Replay(backend) => backend.name(),
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, RemoteServiceError> {
        match self {
            LLMClient::Bedrock(backend) => backend.complete(request).await,
            LLMClient::Ollama(backend) => backend.complete(request).await,
            LLMClient::OpenAI(backend) => backend.complete(request).await,
            LLMClient::Replay(backend) => backend.complete(request).await,
        }
    }
}
