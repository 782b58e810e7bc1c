use crate::{
    CompletionRequest, EmbedResponse, EmbeddingProvider, LlmProvider, NerProvider, ProviderError,
    TaggedEntity,
};

#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for NoopProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        Ok(EmbedResponse {
            vectors: vec![vec![]; texts.len()],
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for NoopProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}

#[async_trait::async_trait]
impl NerProvider for NoopProvider {
    async fn tag(&self, _text: &str) -> Result<Vec<TaggedEntity>, ProviderError> {
        Ok(Vec::new())
    }
}
