//! LM Studio exposes an OpenAI-compatible API without authentication.

use crate::openai::{OpenAiConfig, OpenAiProvider};
use crate::{CompletionRequest, EmbedResponse, EmbeddingProvider, LlmProvider, ProviderError};

#[derive(Clone)]
pub struct LmStudioConfig {
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
}

#[derive(Clone)]
pub struct LmStudioProvider {
    inner: OpenAiProvider,
}

impl LmStudioProvider {
    pub fn new(cfg: LmStudioConfig) -> Self {
        Self {
            inner: OpenAiProvider::new(OpenAiConfig {
                api_key: String::new(),
                base_url: cfg.base_url,
                embedding_model: cfg.embedding_model,
                chat_model: cfg.chat_model,
            }),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for LmStudioProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        self.inner.embed(texts).await
    }
}

#[async_trait::async_trait]
impl LlmProvider for LmStudioProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        // JSON mode is not supported by every local model; the prompt already asks for JSON.
        let mut request = request.clone();
        request.json = false;
        self.inner.complete(&request).await
    }
}
