use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_bedrockruntime::config::Region;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message,
};
use aws_sdk_bedrockruntime::Client;
use tracing::debug;

use super::{CompletionBackend, CompletionRequest};
use crate::error::RemoteServiceError;
use crate::TARGET_LLM_REQUEST;

const NAME: &str = "bedrock";

/// AWS Bedrock through the Converse API.
///
/// Credentials come from the standard AWS provider chain; the region of
/// each request overrides the one the SDK config was loaded with.
#[derive(Debug, Clone)]
pub struct BedrockBackend {
    sdk_config: SdkConfig,
}

impl BedrockBackend {
    pub async fn new(region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self { sdk_config }
    }

    fn client_for(&self, region: &str) -> Client {
        let config = aws_sdk_bedrockruntime::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        Client::from_conf(config)
    }
}

#[async_trait]
impl CompletionBackend for BedrockBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, RemoteServiceError> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(request.prompt.clone()))
            .build()
            .map_err(|e| RemoteServiceError::Request {
                backend: NAME.to_string(),
                message: e.to_string(),
            })?;

        let inference = InferenceConfiguration::builder()
            .temperature(request.temperature)
            .max_tokens(i32::try_from(request.max_tokens).unwrap_or(i32::MAX))
            .build();

        debug!(
            target: TARGET_LLM_REQUEST,
            "Sending Converse request to {} in {}", request.model_id, request.region
        );

        let response = self
            .client_for(&request.region)
            .converse()
            .model_id(&request.model_id)
            .messages(message)
            .inference_config(inference)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) => RemoteServiceError::Rejected {
                    backend: NAME.to_string(),
                    message: DisplayErrorContext(service).to_string(),
                },
                None => RemoteServiceError::Request {
                    backend: NAME.to_string(),
                    message: DisplayErrorContext(&err).to_string(),
                },
            })?;

        let text = response
            .output()
            .and_then(|output| output.as_message().ok())
            .map(|message| {
                message
                    .content()
                    .iter()
                    .filter_map(|block| block.as_text().ok())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }
}
