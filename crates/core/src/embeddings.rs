use providers::{EmbeddingProvider, ProviderError};
use tracing::debug;

/// Embeds `texts` in batches of `batch_size`, preserving order.
///
/// Fails if the provider errors or returns the wrong number of vectors.
pub async fn embed_batched(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, ProviderError> {
    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let resp = provider.embed(batch).await?;
        if resp.vectors.len() != batch.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                batch.len(),
                resp.vectors.len()
            )));
        }
        debug!(batch = batch.len(), "embedded batch");
        vectors.extend(resp.vectors);
    }
    Ok(vectors)
}

/// Embeds a single text.
pub async fn embed_one(
    provider: &dyn EmbeddingProvider,
    text: &str,
) -> Result<Vec<f32>, ProviderError> {
    let texts = [text.to_string()];
    embed_batched(provider, &texts, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("no vector returned".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::hashing::HashingEmbedder;
    use providers::EmbedResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EmbedResponse {
                vectors: texts.iter().map(|t| vec![t.len() as f32]).collect(),
            })
        }
    }

    struct ShortEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for ShortEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<EmbedResponse, ProviderError> {
            Ok(EmbedResponse { vectors: vec![] })
        }
    }

    #[tokio::test]
    async fn batches_preserve_order() {
        let provider = CountingEmbedder {
            calls: AtomicUsize::new(0),
        };
        let texts: Vec<String> = ["a", "bb", "ccc", "dddd", "eeeee"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let vectors = embed_batched(&provider, &texts, 2).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        let lens: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lens, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[tokio::test]
    async fn count_mismatch_is_an_error() {
        let texts = vec!["a".to_string()];
        assert!(embed_batched(&ShortEmbedder, &texts, 4).await.is_err());
        assert!(embed_one(&ShortEmbedder, "a").await.is_err());
    }

    #[tokio::test]
    async fn embed_one_matches_provider() {
        let provider = HashingEmbedder::new(8);
        let v = embed_one(&provider, "notice").await.unwrap();
        assert_eq!(v, provider.embed_one("notice"));
    }
}
