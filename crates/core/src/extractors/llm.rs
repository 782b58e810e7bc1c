use super::SpanExtractor;
use crate::config::{ExtractionConfig, Occurrences};
use crate::llm_json;
use crate::models::{EntityType, Span};
use crate::text::{truncate_chars, CharMap};
use anyhow::Context;
use providers::{CompletionRequest, LlmProvider};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
struct EntityList {
    #[serde(default)]
    entities: Vec<NamedEntity>,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "type")]
    label: Option<String>,
}

fn prompt(excerpt: &str) -> String {
    format!(
        "Extract and identify legal entities from the following legal text. Focus on:\n\n\
         1. PARTY: Names of parties to the agreement/case\n\
         2. LAW: References to laws, acts, statutes, or regulations\n\
         3. COURT: Names of courts\n\
         4. JUDGE: Names of judges\n\
         5. JURISDICTION: Mentioned jurisdictions\n\
         6. LEGAL_TERM: Specialized legal terminology\n\
         7. CASE_CITATION: Citations to legal cases\n\n\
         For each entity, provide the exact text of the entity and its type from the list above.\n\
         Respond with a JSON object of the form \
         {{\"entities\": [{{\"text\": \"...\", \"type\": \"...\"}}]}}.\n\n\
         TEXT:\n{excerpt}"
    )
}

/// Legal entities named by a language model.
///
/// The model only sees the first `max_chars` characters and returns bare
/// strings; spans are recovered by literal search over the full document,
/// so an entity quoted from the excerpt may also be found past it.
pub struct LlmExtractor {
    llm: Arc<dyn LlmProvider>,
    max_chars: usize,
    occurrences: Occurrences,
}

impl LlmExtractor {
    pub fn new(llm: Arc<dyn LlmProvider>, cfg: &ExtractionConfig) -> Self {
        Self {
            llm,
            max_chars: cfg.llm_max_chars,
            occurrences: cfg.occurrences,
        }
    }
}

#[async_trait::async_trait]
impl SpanExtractor for LlmExtractor {
    fn name(&self) -> &str {
        "llm"
    }

    async fn extract_spans(&self, text: &str) -> anyhow::Result<Vec<Span>> {
        let request = CompletionRequest::new(prompt(truncate_chars(text, self.max_chars)))
            .max_tokens(1500)
            .temperature(0.2)
            .json();
        let reply = self.llm.complete(&request).await?;
        let list: EntityList =
            llm_json::parse_object(&reply).context("entity list is not valid JSON")?;
        debug!(named = list.entities.len(), "language model named entities");
        Ok(locate(text, &list.entities, self.occurrences))
    }
}

fn locate(text: &str, entities: &[NamedEntity], occurrences: Occurrences) -> Vec<Span> {
    let map = CharMap::new(text);
    let mut spans = Vec::new();
    for entity in entities {
        if entity.text.is_empty() {
            continue;
        }
        let label = entity
            .label
            .as_deref()
            .map(EntityType::parse)
            .unwrap_or(EntityType::LegalTerm);
        let matches = text.match_indices(entity.text.as_str()).map(|(byte, m)| {
            Span::new(
                m,
                map.to_char(byte),
                map.to_char(byte + m.len()),
                label.clone(),
            )
        });
        match occurrences {
            Occurrences::All => spans.extend(matches),
            Occurrences::First => spans.extend(matches.take(1)),
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::ProviderError;
    use std::sync::Mutex;

    struct Scripted {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for Scripted {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
            assert!(request.json);
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(self.reply.clone())
        }
    }

    const TEXT: &str = "The Lessee shall pay. The Lessee may renew. Governed by Texas law.";

    fn cfg(occurrences: Occurrences) -> ExtractionConfig {
        ExtractionConfig {
            occurrences,
            ..ExtractionConfig::default()
        }
    }

    #[tokio::test]
    async fn every_occurrence_becomes_a_span() {
        let llm = Scripted::new(
            r#"{"entities": [{"text": "Lessee", "type": "PARTY"}, {"text": "Texas", "type": "JURISDICTION"}]}"#,
        );
        let spans = LlmExtractor::new(llm, &cfg(Occurrences::All))
            .extract_spans(TEXT)
            .await
            .unwrap();
        assert_eq!(
            spans,
            vec![
                Span::new("Lessee", 4, 10, "PARTY"),
                Span::new("Lessee", 26, 32, "PARTY"),
                Span::new("Texas", 56, 61, "JURISDICTION"),
            ]
        );
    }

    #[tokio::test]
    async fn first_occurrence_only() {
        let llm = Scripted::new(r#"{"entities": [{"text": "Lessee", "type": "PARTY"}]}"#);
        let spans = LlmExtractor::new(llm, &cfg(Occurrences::First))
            .extract_spans(TEXT)
            .await
            .unwrap();
        assert_eq!(spans, vec![Span::new("Lessee", 4, 10, "PARTY")]);
    }

    #[tokio::test]
    async fn missing_type_and_empty_text() {
        let llm = Scripted::new(
            r#"{"entities": [{"text": "renew"}, {"text": "", "type": "LAW"}, {"text": "absent", "type": "LAW"}]}"#,
        );
        let spans = LlmExtractor::new(llm, &cfg(Occurrences::All))
            .extract_spans(TEXT)
            .await
            .unwrap();
        assert_eq!(spans, vec![Span::new("renew", 37, 42, "LEGAL_TERM")]);
    }

    #[tokio::test]
    async fn malformed_reply_is_an_error() {
        let llm = Scripted::new("I could not find any entities.");
        let result = LlmExtractor::new(llm, &cfg(Occurrences::All))
            .extract_spans(TEXT)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn prompt_sees_truncated_text_but_search_covers_all() {
        let text = format!("{}Acme Corp", "x".repeat(50));
        let llm = Scripted::new(r#"{"entities": [{"text": "Acme Corp", "type": "PARTY"}]}"#);
        let extraction = ExtractionConfig {
            llm_max_chars: 20,
            ..ExtractionConfig::default()
        };
        let spans = LlmExtractor::new(llm.clone(), &extraction)
            .extract_spans(&text)
            .await
            .unwrap();
        assert_eq!(spans, vec![Span::new("Acme Corp", 50, 59, "PARTY")]);
        let prompts = llm.prompts.lock().unwrap();
        assert!(!prompts[0].contains("Acme"));
    }
}
