//! services/api/src/adapters/genai.rs
//!
//! This module contains the adapter for the generative-text backend used by the
//! study tools. It implements the `TextGenerationService` port from the `core` crate
//! against any OpenAI-compatible chat endpoint.

const SYSTEM_INSTRUCTIONS: &str = "أنت مساعد متخصص في علوم القرآن الكريم وتفسيره. \
أجب باللغة العربية الفصحى بأسلوب واضح ومختصر، والتزم بالمصادر الموثوقة، \
ولا تخترع نصوصاً أو أحاديث غير ثابتة.";

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use quran_study_core::ports::{PortError, PortResult, ResponseMode, TextGenerationService};
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` using an OpenAI-compatible LLM.
///
/// Without a client the adapter reports no credential and refuses every request, so
/// the orchestrator can surface a configuration error without touching the network.
#[derive(Clone)]
pub struct GenAiStudyAdapter {
    client: Option<Client<OpenAIConfig>>,
    model: String,
}

impl GenAiStudyAdapter {
    /// Creates a new `GenAiStudyAdapter`.
    pub fn new(client: Option<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the adapter from an optional key and an API base URL.
    pub fn from_key(api_key: Option<&str>, api_base: &str, model: String) -> Self {
        let client = api_key.map(|key| {
            let config = OpenAIConfig::new()
                .with_api_key(key)
                .with_api_base(api_base);
            Client::with_config(config)
        });
        Self::new(client, model)
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for GenAiStudyAdapter {
    fn has_credential(&self) -> bool {
        self.client.is_some()
    }

    async fn generate(&self, prompt: &str, mode: ResponseMode) -> PortResult<String> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| PortError::MissingCredential("GENAI_API_KEY".to_string()))?;

        debug!("Generating {:?} response with model {}", mode, self.model);

        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_INSTRUCTIONS)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system),
                ChatCompletionRequestMessage::User(user),
            ]);
        if mode == ResponseMode::Json {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let request = builder
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| {
                warn!("Generative backend call failed: {}", e);
                PortError::Unexpected(e.to_string())
            })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PortError::Malformed("response carried no text".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_follows_client_presence() {
        let without = GenAiStudyAdapter::from_key(None, "http://localhost:9", "m".into());
        assert!(!without.has_credential());

        let with = GenAiStudyAdapter::from_key(Some("key"), "http://localhost:9", "m".into());
        assert!(with.has_credential());
    }

    #[tokio::test]
    async fn generate_without_credential_is_refused() {
        let adapter = GenAiStudyAdapter::new(None, "m".into());
        let err = adapter.generate("hello", ResponseMode::Text).await.unwrap_err();
        assert!(matches!(err, PortError::MissingCredential(_)));
    }
}
