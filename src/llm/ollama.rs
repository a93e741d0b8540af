use async_trait::async_trait;
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use ollama_rs::generation::parameters::{FormatType, JsonStructure};
use ollama_rs::Ollama;
use tracing::debug;

use super::{CompletionBackend, CompletionRequest};
use crate::error::RemoteServiceError;
use crate::mention::MentionsList;
use crate::TARGET_LLM_REQUEST;

const NAME: &str = "ollama";

/// A local or self-hosted Ollama server.
///
/// Replies are constrained to the `MentionsList` JSON schema.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    ollama: Ollama,
}

impl OllamaBackend {
    pub fn new(host: &str, port: u16) -> Self {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        Self {
            ollama: Ollama::new(base_url, port),
        }
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, RemoteServiceError> {
        let mut generation = GenerationRequest::new(request.model_id.clone(), request.prompt.clone());
        generation.options = Some(
            GenerationOptions::default()
                .temperature(request.temperature)
                .num_predict(i32::try_from(request.max_tokens).unwrap_or(i32::MAX)),
        );
        generation.format = Some(FormatType::StructuredJson(JsonStructure::new::<MentionsList>()));

        debug!(target: TARGET_LLM_REQUEST, "Sending generation request to {}", request.model_id);

        let response = self
            .ollama
            .generate(generation)
            .await
            .map_err(|e| RemoteServiceError::Request {
                backend: NAME.to_string(),
                message: e.to_string(),
            })?;

        Ok(response.response)
    }
}
