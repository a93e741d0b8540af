use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client as OpenAIClient;
use async_trait::async_trait;
use tracing::debug;

use super::{CompletionBackend, CompletionRequest};
use crate::error::RemoteServiceError;
use crate::TARGET_LLM_REQUEST;

const NAME: &str = "openai";

/// OpenAI chat completions in JSON-object mode.
#[derive(Debug, Clone)]
pub struct OpenAIBackend {
    client: OpenAIClient<OpenAIConfig>,
}

impl OpenAIBackend {
    /// Without an explicit key the client falls back to `OPENAI_API_KEY`.
    pub fn new(api_key: Option<String>) -> Self {
        let config = match api_key {
            Some(key) => OpenAIConfig::new().with_api_key(key),
            None => OpenAIConfig::new(),
        };
        Self {
            client: OpenAIClient::with_config(config),
        }
    }
}

fn map_error(err: OpenAIError) -> RemoteServiceError {
    match err {
        OpenAIError::ApiError(api) => RemoteServiceError::Rejected {
            backend: NAME.to_string(),
            message: api.message,
        },
        other => RemoteServiceError::Request {
            backend: NAME.to_string(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl CompletionBackend for OpenAIBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, RemoteServiceError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.as_str())
            .build()
            .map_err(map_error)?;
        let messages: Vec<ChatCompletionRequestMessage> = vec![message.into()];

        let chat = CreateChatCompletionRequestArgs::default()
            .model(request.model_id.as_str())
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(map_error)?;

        debug!(target: TARGET_LLM_REQUEST, "Sending chat completion to {}", request.model_id);

        let response = self.client.chat().create(chat).await.map_err(map_error)?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(text)
    }
}
