//! One analysed document and the conversation about it.

use crate::analysis::{analyze_document, DocumentAnalysis};
use crate::chat::{self, ChatTurn};
use crate::config::AppConfig;
use crate::extractors::{collect_spans, SourceReport, SpanExtractor};
use crate::highlight::highlight_html;
use crate::indexer::ChunkIndex;
use crate::models::Span;
use crate::resolver::{resolve, sort_by_position};
use crate::search::{fallback_context, search};
use anyhow::Context;
use providers::{EmbeddingProvider, LlmProvider, ProviderRegistry};
use std::sync::Arc;
use tracing::{info, warn};

/// Dependencies handed to every session operation.
#[derive(Clone)]
pub struct Services {
    pub registry: ProviderRegistry,
    pub extractors: Vec<Arc<dyn SpanExtractor>>,
    pub config: AppConfig,
}

impl Services {
    pub fn llm(&self) -> anyhow::Result<Arc<dyn LlmProvider>> {
        self.registry.llm(None).context("no language model available")
    }

    pub fn embeddings(&self) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
        self.registry
            .embedding(None)
            .context("no embedding provider available")
    }
}

/// Everything known about the active document. Opening another document
/// means building a new session; nothing carries over.
pub struct DocumentSession {
    pub name: String,
    pub text: String,
    pub analysis: DocumentAnalysis,
    pub entities: Vec<Span>,
    pub sources: Vec<SourceReport>,
    index: ChunkIndex,
    history: Vec<ChatTurn>,
}

impl DocumentSession {
    /// Analysis, entity extraction and resolution, then the chunk index.
    pub async fn analyze(name: &str, text: String, services: &Services) -> anyhow::Result<Self> {
        let llm = services.llm()?;
        let analysis = analyze_document(&text, llm.as_ref(), &services.config.analysis).await?;

        let collected = collect_spans(&services.extractors, &text).await;
        let candidates = collected.spans.len();
        let entities = sort_by_position(&resolve(collected.spans));
        info!(document = name, candidates, entities = entities.len(), "entities resolved");

        let index = build_index(&text, services).await;
        Ok(Self {
            name: name.to_string(),
            text,
            analysis,
            entities,
            sources: collected.sources,
            index,
            history: Vec::new(),
        })
    }

    /// Reopens a stored document. Only the chunk index is rebuilt.
    pub async fn restore(
        name: &str,
        text: String,
        analysis: DocumentAnalysis,
        entities: Vec<Span>,
        history: Vec<ChatTurn>,
        services: &Services,
    ) -> Self {
        let index = build_index(&text, services).await;
        Self {
            name: name.to_string(),
            text,
            analysis,
            entities,
            sources: Vec::new(),
            index,
            history,
        }
    }

    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn highlighted_html(&self) -> String {
        highlight_html(&self.text, &self.entities)
    }

    /// Context for `query`; any retrieval failure falls back to the start of
    /// the document.
    pub async fn context_for(&self, query: &str, services: &Services) -> String {
        let retrieval = &services.config.retrieval;
        let provider = match services.embeddings() {
            Ok(p) => p,
            Err(err) => {
                warn!(error = %err, "retrieval unavailable, using document start");
                return fallback_context(&self.text, retrieval.fallback_chars);
            }
        };
        match search(
            query,
            &self.index,
            provider.as_ref(),
            retrieval.top_k,
            Some(&self.text),
            retrieval.fallback_chars,
        )
        .await
        {
            Ok(context) => context,
            Err(err) => {
                warn!(error = %err, "retrieval failed, using document start");
                fallback_context(&self.text, retrieval.fallback_chars)
            }
        }
    }

    pub async fn ask(&mut self, question: &str, services: &Services) -> anyhow::Result<String> {
        let context = self.context_for(question, services).await;
        let llm = services.llm()?;
        let reply = chat::answer(question, &context, Some(&self.analysis), llm.as_ref())
            .await
            .context("answering question")?;
        self.history.push(ChatTurn {
            question: question.to_string(),
            answer: reply.clone(),
        });
        Ok(reply)
    }
}

async fn build_index(text: &str, services: &Services) -> ChunkIndex {
    let provider = match services.embeddings() {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "no embedding provider, document will not be indexed");
            return ChunkIndex::empty();
        }
    };
    match ChunkIndex::build(
        text,
        &services.config.chunking,
        provider.as_ref(),
        services.config.embeddings.batch_size,
    )
    .await
    {
        Ok(index) => index,
        Err(err) => {
            warn!(error = %err, "chunk index build failed, search will use the document start");
            ChunkIndex::empty()
        }
    }
}
