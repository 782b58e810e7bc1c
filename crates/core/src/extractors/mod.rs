//! Span extractors and the step that merges their output.
//!
//! Every extractor reports character offsets against the original,
//! unmodified document.

use crate::models::Span;
use crate::text::char_len;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

pub mod llm;
pub mod pattern;
pub mod tagger;

pub use llm::LlmExtractor;
pub use pattern::PatternExtractor;
pub use tagger::TaggerExtractor;

#[async_trait::async_trait]
pub trait SpanExtractor: Send + Sync {
    fn name(&self) -> &str;
    async fn extract_spans(&self, text: &str) -> anyhow::Result<Vec<Span>>;
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub name: String,
    pub spans: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectedSpans {
    pub spans: Vec<Span>,
    pub sources: Vec<SourceReport>,
}

/// Concatenates the candidates of every extractor.
///
/// A failing extractor contributes nothing. Spans with `start >= end` or
/// reaching past the document are dropped.
pub async fn collect_spans(extractors: &[Arc<dyn SpanExtractor>], text: &str) -> CollectedSpans {
    let doc_len = char_len(text);
    let mut collected = CollectedSpans::default();
    if doc_len == 0 {
        return collected;
    }

    for extractor in extractors {
        let name = extractor.name().to_string();
        match extractor.extract_spans(text).await {
            Ok(spans) => {
                let before = spans.len();
                let valid: Vec<Span> = spans
                    .into_iter()
                    .filter(|s| !s.is_degenerate() && s.end <= doc_len)
                    .collect();
                if valid.len() < before {
                    warn!(
                        extractor = %name,
                        dropped = before - valid.len(),
                        "dropped spans with invalid offsets"
                    );
                }
                debug!(extractor = %name, spans = valid.len(), "extractor finished");
                collected.sources.push(SourceReport {
                    name,
                    spans: valid.len(),
                    error: None,
                });
                collected.spans.extend(valid);
            }
            Err(err) => {
                warn!(extractor = %name, error = %err, "extractor failed, continuing without it");
                collected.sources.push(SourceReport {
                    name,
                    spans: 0,
                    error: Some(err.to_string()),
                });
            }
        }
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Span>);

    #[async_trait::async_trait]
    impl SpanExtractor for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn extract_spans(&self, _text: &str) -> anyhow::Result<Vec<Span>> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    #[async_trait::async_trait]
    impl SpanExtractor for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn extract_spans(&self, _text: &str) -> anyhow::Result<Vec<Span>> {
            anyhow::bail!("model returned garbage")
        }
    }

    #[tokio::test]
    async fn failing_source_contributes_nothing() {
        let extractors: Vec<Arc<dyn SpanExtractor>> = vec![
            Arc::new(Broken),
            Arc::new(Fixed(vec![Span::new("Acme", 0, 4, "ORG")])),
        ];
        let collected = collect_spans(&extractors, "Acme signs.").await;
        assert_eq!(collected.spans, vec![Span::new("Acme", 0, 4, "ORG")]);
        assert_eq!(collected.sources.len(), 2);
        assert!(collected.sources[0].error.is_some());
        assert_eq!(collected.sources[1].spans, 1);
    }

    #[tokio::test]
    async fn invalid_offsets_are_dropped() {
        let extractors: Vec<Arc<dyn SpanExtractor>> = vec![Arc::new(Fixed(vec![
            Span::new("", 2, 2, "ORG"),
            Span::new("x", 5, 99, "ORG"),
            Span::new("signs", 5, 10, "LEGAL_TERM"),
        ]))];
        let collected = collect_spans(&extractors, "Acme signs.").await;
        assert_eq!(collected.spans, vec![Span::new("signs", 5, 10, "LEGAL_TERM")]);
    }

    #[tokio::test]
    async fn empty_document_yields_nothing() {
        let extractors: Vec<Arc<dyn SpanExtractor>> =
            vec![Arc::new(Fixed(vec![Span::new("a", 0, 1, "ORG")]))];
        let collected = collect_spans(&extractors, "").await;
        assert!(collected.spans.is_empty());
    }
}
