//! services/api/src/adapters/qa_llm.rs
//!
//! This module contains the adapter for the question-answering LLM.
//! It implements the `QuestionAnsweringService` port from the `core` crate against
//! any OpenAI-compatible chat completion endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use docqa_core::ports::{PortError, PortResult, QuestionAnsweringService};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QuestionAnsweringService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiQaAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiQaAdapter {
    /// Creates a new `OpenAiQaAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `QuestionAnsweringService` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuestionAnsweringService for OpenAiQaAdapter {
    /// Sends the prompt as a single user message and returns the first choice's text.
    async fn answer(&self, prompt: &str) -> PortResult<String> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "Requesting answer.");

        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        // Extract the text content from the first choice in the response.
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Answering model returned no text content.".to_string())
            })
    }
}

//=========================================================================================
// Error Classification
//=========================================================================================

/// Error types and codes the API returns for requests that will never succeed as sent:
/// bad keys, unknown models, prompts over the context window, exhausted quota.
const PERMANENT_ERROR_TYPES: &[&str] = &[
    "invalid_request_error",
    "authentication_error",
    "permission_error",
    "not_found_error",
    "insufficient_quota",
];
const PERMANENT_ERROR_CODES: &[&str] = &[
    "invalid_api_key",
    "context_length_exceeded",
    "model_not_found",
    "insufficient_quota",
];

fn is_permanent(err: &ApiError) -> bool {
    err.r#type
        .as_deref()
        .is_some_and(|t| PERMANENT_ERROR_TYPES.contains(&t))
        || err
            .code
            .as_deref()
            .is_some_and(|c| PERMANENT_ERROR_CODES.contains(&c))
}

/// Client-side rejections become `PortError::Rejected`; transport failures, 5xx
/// responses and rate limits stay `PortError::Unexpected` so they can be retried.
fn map_openai_error(err: OpenAIError) -> PortError {
    match err {
        OpenAIError::ApiError(api) if is_permanent(&api) => PortError::Rejected(api.to_string()),
        OpenAIError::InvalidArgument(msg) => PortError::Rejected(msg),
        other => PortError::Unexpected(other.to_string()),
    }
}
