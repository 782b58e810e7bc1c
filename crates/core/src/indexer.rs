use crate::chunker::{self, Chunk, ChunkingError};
use crate::config::ChunkingConfig;
use crate::embeddings::embed_batched;
use crate::vectorstore::{FlatL2Index, VectorIndex};
use providers::{EmbeddingProvider, ProviderError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid chunking settings: {0}")]
    Chunking(#[from] ChunkingError),
    #[error("embedding failed: {0}")]
    Embedding(#[from] ProviderError),
    #[error("embedding provider returned empty vectors")]
    EmptyEmbedding,
    #[error("chunk {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// Ordered chunks of one document with their embeddings.
///
/// Built wholesale per document and never patched; a failed embedding call
/// fails the whole build.
#[derive(Debug, Clone, Default)]
pub struct ChunkIndex {
    chunks: Vec<Chunk>,
    index: FlatL2Index,
}

#[derive(Debug, Clone)]
pub struct ChunkHit<'a> {
    pub chunk: &'a Chunk,
    pub distance: f32,
}

impl ChunkIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub async fn build(
        text: &str,
        cfg: &ChunkingConfig,
        provider: &dyn EmbeddingProvider,
        batch_size: usize,
    ) -> Result<Self, IndexError> {
        let chunks = chunker::split(text, cfg)?;
        if chunks.is_empty() {
            return Ok(Self::empty());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_batched(provider, &texts, batch_size).await?;

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(IndexError::EmptyEmbedding);
        }
        let mut index = FlatL2Index::new(dimension);
        for (i, vector) in vectors.into_iter().enumerate() {
            let found = vector.len();
            index.add(vector).ok_or(IndexError::DimensionMismatch {
                index: i,
                expected: dimension,
                found,
            })?;
        }

        info!(chunks = chunks.len(), dimension, "built chunk index");
        Ok(Self { chunks, index })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    #[cfg(test)]
    pub fn embedding(&self, chunk: usize) -> Option<&[f32]> {
        self.index.vector(chunk)
    }

    /// Up to `k` chunks closest to `query`, closest first.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<ChunkHit<'_>> {
        self.index
            .nearest(query, k)
            .into_iter()
            .filter_map(|n| {
                self.chunks.get(n.id).map(|chunk| ChunkHit {
                    chunk,
                    distance: n.distance,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::hashing::HashingEmbedder;
    use providers::noop::NoopProvider;
    use providers::EmbedResponse;

    struct FailingEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<EmbedResponse, ProviderError> {
            Err(ProviderError::RequestFailed("offline".into()))
        }
    }

    struct RaggedEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for RaggedEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
            Ok(EmbedResponse {
                vectors: texts.iter().enumerate().map(|(i, _)| vec![0.0; i + 1]).collect(),
            })
        }
    }

    fn cfg() -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: 60,
            overlap: 10,
        }
    }

    const TEXT: &str = "The tenant pays rent on the first of each month.\n\n\
        The landlord repairs the roof and the heating.\n\n\
        Disputes are settled by arbitration in Boston.";

    #[tokio::test]
    async fn builds_one_vector_per_chunk() {
        let provider = HashingEmbedder::new(32);
        let index = ChunkIndex::build(TEXT, &cfg(), &provider, 2).await.unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dimension(), 32);
        for (i, chunk) in index.chunks().iter().enumerate() {
            assert_eq!(index.embedding(i).unwrap(), provider.embed_one(&chunk.text).as_slice());
        }
    }

    #[tokio::test]
    async fn empty_document_gives_empty_index() {
        let index = ChunkIndex::build("", &cfg(), &FailingEmbedder, 4).await.unwrap();
        assert!(index.is_empty());
        assert!(index.nearest(&[0.0], 3).is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_is_fatal() {
        let err = ChunkIndex::build(TEXT, &cfg(), &FailingEmbedder, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Embedding(_)));
    }

    #[tokio::test]
    async fn empty_or_ragged_vectors_are_rejected() {
        let err = ChunkIndex::build(TEXT, &cfg(), &NoopProvider, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::EmptyEmbedding));

        // First vector has dimension 1, second has 2.
        let err = ChunkIndex::build(TEXT, &cfg(), &RaggedEmbedder, 4)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                index: 1,
                expected: 1,
                found: 2
            }
        ));
    }

    #[tokio::test]
    async fn nearest_finds_matching_chunk() {
        let provider = HashingEmbedder::new(256);
        let index = ChunkIndex::build(TEXT, &cfg(), &provider, 8).await.unwrap();
        let query = provider.embed_one("arbitration disputes Boston");
        let hits = index.nearest(&query, 1);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].chunk.text.contains("arbitration"));
    }
}
