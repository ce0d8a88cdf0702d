//! OpenAI-compatible chat provider.
//!
//! One adapter covers whichever inference endpoint the platform runs --
//! TabbyAPI, an MLX server, or any hosted OpenAI-compatible API -- via a
//! configurable base URL. Uses [`async_openai`] for type-safe
//! request/response handling.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};

use nebulus_core::llm::provider::LlmProvider;
use nebulus_types::llm::{LlmError, Message, MessageRole};

/// Default sampling temperature, matching the platform's inference default.
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Provider for any OpenAI-compatible chat completion endpoint.
///
/// Does NOT derive Debug, so the API key inside the `async_openai::Client`
/// cannot leak through formatting.
pub struct OpenAiCompatProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiCompatProvider {
    /// Create a provider against `base_url` (e.g. `http://localhost:5000/v1`).
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(base_url.trim_end_matches('/'))
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
        }
    }

    /// Model ids available on the inference server.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        let models = self
            .client
            .models()
            .list()
            .await
            .map_err(map_openai_error)?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn build_request(messages: &[Message], model: &str) -> CreateChatCompletionRequest {
        let oai_messages = messages
            .iter()
            .map(|msg| match msg.role {
                MessageRole::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: ChatCompletionRequestSystemMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    })
                }
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                        name: None,
                    })
                }
                MessageRole::Assistant =>
                {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            msg.content.clone(),
                        )),
                        refusal: None,
                        name: None,
                        audio: None,
                        tool_calls: None,
                        function_call: None,
                    })
                }
            })
            .collect();

        CreateChatCompletionRequest {
            model: model.to_string(),
            messages: oai_messages,
            temperature: Some(DEFAULT_TEMPERATURE),
            ..Default::default()
        }
    }
}

impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn chat(&self, messages: &[Message], model: &str) -> Result<String, LlmError> {
        let request = Self::build_request(messages, model);

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| LlmError::Deserialization("completion had no content".to_string()))
    }
}

fn map_openai_error(err: async_openai::error::OpenAIError) -> LlmError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "authentication_error"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API key")
            {
                LlmError::AuthenticationFailed
            } else if code == "invalid_request_error" || error_type == "invalid_request_error" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::JSONDeserialize(_, _) => LlmError::Deserialization(err.to_string()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}
