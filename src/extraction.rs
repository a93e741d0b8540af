//! End-to-end extraction: prompt, one remote completion, validated parse.

use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::error::{ConfigError, ExtractionError, RemoteServiceError};
use crate::llm::{CompletionBackend, CompletionRequest};
use crate::mention::{self, MentionsList};
use crate::prompt::extraction_prompt;
use crate::{TARGET_EXTRACTION, TARGET_LLM_REQUEST};

/// Finds stock mentions in transcripts through a remote model.
///
/// Holds no mutable state; one extractor can serve any number of calls.
pub struct Extractor<B: CompletionBackend> {
    config: ExtractorConfig,
    backend: B,
    format_instructions: String,
}

impl<B: CompletionBackend> Extractor<B> {
    pub fn new(config: ExtractorConfig, backend: B) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            format_instructions: mention::describe_schema(),
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The exact prompt `extract` would send for `transcript`.
    pub fn render_prompt(&self, transcript: &str) -> String {
        extraction_prompt(transcript, &self.format_instructions)
    }

    fn completion_request(&self, transcript: &str) -> CompletionRequest {
        CompletionRequest {
            prompt: self.render_prompt(transcript),
            model_id: self.config.model_id.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            region: self.config.region.clone(),
        }
    }

    /// Send `transcript` to the model once and return the validated mentions.
    ///
    /// Remote failures (including the configured deadline expiring) and
    /// invalid replies are returned as-is; nothing is retried.
    pub async fn extract(&self, transcript: &str) -> Result<MentionsList, ExtractionError> {
        let request = self.completion_request(transcript);
        let backend = self.backend.name();

        info!(
            target: TARGET_EXTRACTION,
            "Extracting mentions from {} character transcript using {} ({})",
            transcript.chars().count(),
            backend,
            request.model_id
        );
        debug!(target: TARGET_LLM_REQUEST, "Sending prompt: {}", request.prompt);

        let started = Instant::now();
        let raw = match timeout(self.config.request_timeout, self.backend.complete(&request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(target: TARGET_LLM_REQUEST, "Completion failed: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    target: TARGET_LLM_REQUEST,
                    "{} request timed out after {:?}", backend, self.config.request_timeout
                );
                return Err(RemoteServiceError::Timeout {
                    backend: backend.to_string(),
                    after: self.config.request_timeout,
                }
                .into());
            }
        };

        debug!(
            target: TARGET_LLM_REQUEST,
            "LLM response received after {:?}: {}",
            started.elapsed(),
            raw
        );

        let mentions = mention::parse(&raw).map_err(|e| {
            warn!(target: TARGET_EXTRACTION, "Rejected model reply: {}", e);
            e
        })?;

        info!(
            target: TARGET_EXTRACTION,
            "Extracted {} mentions", mentions.len()
        );

        Ok(mentions)
    }
}
