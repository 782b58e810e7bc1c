//! Context retrieval for question answering.

use crate::embeddings::embed_one;
use crate::indexer::{ChunkHit, ChunkIndex};
use crate::text::truncate_chars;
use providers::{EmbeddingProvider, ProviderError};
use tracing::debug;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_FALLBACK_CHARS: usize = 3000;

/// Nearest chunks to `query`, closest first. `k` is clamped to the chunk count.
pub async fn retrieve<'a>(
    query: &str,
    index: &'a ChunkIndex,
    provider: &dyn EmbeddingProvider,
    k: usize,
) -> Result<Vec<ChunkHit<'a>>, ProviderError> {
    if index.is_empty() || k == 0 {
        return Ok(Vec::new());
    }
    let vector = embed_one(provider, query).await?;
    Ok(index.nearest(&vector, k.min(index.len())))
}

/// Retrieved chunks joined by a blank line in rank order.
///
/// When nothing is retrieved and `full_text` is given, the first
/// `fallback_chars` characters of it are returned instead.
pub async fn search(
    query: &str,
    index: &ChunkIndex,
    provider: &dyn EmbeddingProvider,
    k: usize,
    full_text: Option<&str>,
    fallback_chars: usize,
) -> Result<String, ProviderError> {
    let hits = retrieve(query, index, provider, k).await?;
    if hits.is_empty() {
        if let Some(text) = full_text {
            debug!("no chunks retrieved, using full-text fallback");
            return Ok(fallback_context(text, fallback_chars));
        }
        return Ok(String::new());
    }
    Ok(hits
        .iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

pub fn fallback_context(full_text: &str, max_chars: usize) -> String {
    truncate_chars(full_text, max_chars).to_string()
}
