//! Summary, document type and key facts of a legal document.
//!
//! The model's output is treated as opaque text; only the classification and
//! key-information replies are parsed, and both degrade to neutral values
//! when the reply is unusable.

use crate::chunker;
use crate::config::{AnalysisConfig, ChunkingConfig};
use crate::llm_json;
use crate::text::{char_len, truncate_chars};
use anyhow::Context;
use providers::{CompletionRequest, LlmProvider};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

pub const DEFAULT_DOCUMENT_TYPE: &str = "Legal Document";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentType {
    #[serde(default = "default_label")]
    pub document_type: String,
    #[serde(default)]
    pub explanation: String,
}

fn default_label() -> String {
    DEFAULT_DOCUMENT_TYPE.to_string()
}

impl Default for DocumentType {
    fn default() -> Self {
        Self {
            document_type: default_label(),
            explanation: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    pub summary: String,
    pub document_type: DocumentType,
    #[serde(default)]
    pub key_information: Map<String, Value>,
}

pub async fn analyze_document(
    text: &str,
    llm: &dyn LlmProvider,
    cfg: &AnalysisConfig,
) -> anyhow::Result<DocumentAnalysis> {
    let summary = summarize(text, llm, cfg).await?;

    let long = char_len(text) > cfg.long_document_chars;
    let document_type = classify(if long { summary.as_str() } else { text }, llm, cfg).await;

    let excerpt = if long {
        let chunks = chunker::split(
            text,
            &ChunkingConfig {
                chunk_size: cfg.key_info_chunk_size,
                overlap: cfg.key_info_chunk_overlap,
            },
        )?;
        chunks.into_iter().next().map(|c| c.text).unwrap_or_default()
    } else {
        text.to_string()
    };
    let key_information = key_information(&excerpt, &document_type, llm, cfg).await;

    info!(
        document_type = %document_type.document_type,
        key_fields = key_information.len(),
        long,
        "document analysed"
    );
    Ok(DocumentAnalysis {
        summary,
        document_type,
        key_information,
    })
}

async fn summarize(
    text: &str,
    llm: &dyn LlmProvider,
    cfg: &AnalysisConfig,
) -> anyhow::Result<String> {
    let prompt = format!(
        "Please provide a comprehensive summary of the following legal document.\n\
         Include the main purpose, key points, and any notable provisions or clauses:\n\n{}",
        truncate_chars(text, cfg.summary_max_chars)
    );
    let request = CompletionRequest::new(prompt).max_tokens(1000).temperature(0.3);
    llm.complete(&request).await.context("summarising document")
}

/// Never fails; an unusable reply yields the generic label.
pub async fn classify(text: &str, llm: &dyn LlmProvider, cfg: &AnalysisConfig) -> DocumentType {
    let prompt = format!(
        "Based on the following legal document, identify the specific type of legal document it is \
         (e.g., contract, NDA, employment agreement, terms of service, privacy policy, patent, \
         trademark registration, court filing, etc.).\n\n\
         Respond with a JSON object with a concise \"document_type\" label and a short \
         \"explanation\" of what indicates this document type:\n\n{}",
        truncate_chars(text, cfg.classify_max_chars)
    );
    let request = CompletionRequest::new(prompt)
        .max_tokens(150)
        .temperature(0.2)
        .json();
    match llm.complete(&request).await {
        Ok(reply) => parse_document_type(&reply),
        Err(err) => {
            warn!(error = %err, "classification request failed");
            DocumentType::default()
        }
    }
}

pub fn parse_document_type(reply: &str) -> DocumentType {
    match llm_json::parse_object::<DocumentType>(reply) {
        Ok(t) if !t.document_type.trim().is_empty() => t,
        Ok(_) => DocumentType::default(),
        Err(err) => {
            warn!(error = %err, "unparseable classification reply");
            DocumentType::default()
        }
    }
}

async fn key_information(
    excerpt: &str,
    document_type: &DocumentType,
    llm: &dyn LlmProvider,
    cfg: &AnalysisConfig,
) -> Map<String, Value> {
    let prompt = format!(
        "You are analyzing a {label}.\n\
         Based on the following document excerpt, extract the key information relevant to this \
         type of legal document.\n\n\
         For example, for contracts, extract parties, dates, values, jurisdiction, etc.\n\
         For court filings, extract case number, parties, court, filing date, etc.\n\
         For patents/trademarks, extract filing numbers, owners, dates, descriptions, etc.\n\n\
         Document excerpt:\n{excerpt}\n\n\
         Extract and organize the key information as JSON with appropriate fields for this \
         document type. Only include fields where you find specific information in the document.",
        label = document_type.document_type,
        excerpt = truncate_chars(excerpt, cfg.key_info_max_chars),
    );
    let request = CompletionRequest::new(prompt)
        .max_tokens(1000)
        .temperature(0.2)
        .json();
    match llm.complete(&request).await {
        Ok(reply) => parse_key_information(&reply),
        Err(err) => {
            warn!(error = %err, "key information request failed");
            Map::new()
        }
    }
}

pub fn parse_key_information(reply: &str) -> Map<String, Value> {
    llm_json::parse_object::<Map<String, Value>>(reply).unwrap_or_else(|err| {
        warn!(error = %err, "unparseable key information reply");
        Map::new()
    })
}

/// Bullet list of key facts; nested objects become indented sub-bullets.
pub fn format_key_information(info: &Map<String, Value>) -> String {
    let mut out = String::new();
    for (key, value) in info {
        match value {
            Value::Object(inner) => {
                out.push_str(&format!("- {key}:\n"));
                for (sub_key, sub_value) in inner {
                    out.push_str(&format!("  - {sub_key}: {}\n", scalar(sub_value)));
                }
            }
            other => out.push_str(&format!("- {key}: {}\n", scalar(other))),
        }
    }
    out
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(scalar).collect::<Vec<_>>().join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::ProviderError;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies in order and records every prompt it was given.
    struct Scripted {
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<&str, ProviderError>>) -> Self {
            Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .rev()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for Scripted {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ProviderError::NotImplemented))
        }
    }

    fn small() -> AnalysisConfig {
        AnalysisConfig {
            long_document_chars: 100,
            key_info_chunk_size: 40,
            key_info_chunk_overlap: 5,
            ..AnalysisConfig::default()
        }
    }

    #[tokio::test]
    async fn short_document_is_classified_from_its_text() {
        let llm = Scripted::new(vec![
            Ok("A lease."),
            Ok(r#"{"document_type": "Lease", "explanation": "rent terms"}"#),
            Ok(r#"{"parties": {"landlord": "Ann", "tenant": "Bob"}, "rent": "$900"}"#),
        ]);
        let text = "Ann leases the flat to Bob for $900.";
        let analysis = analyze_document(text, &llm, &small()).await.unwrap();

        assert_eq!(analysis.summary, "A lease.");
        assert_eq!(analysis.document_type.document_type, "Lease");
        assert_eq!(analysis.key_information["rent"], json!("$900"));
        let prompts = llm.prompts();
        assert!(prompts[1].contains(text));
        assert!(prompts[2].contains("You are analyzing a Lease."));
        assert!(prompts[2].contains(text));
    }

    #[tokio::test]
    async fn long_document_is_classified_from_its_summary() {
        let llm = Scripted::new(vec![
            Ok("SUMMARY TEXT"),
            Ok(r#"{"document_type": "NDA"}"#),
            Ok("{}"),
        ]);
        let text = format!("{} TAIL", "word ".repeat(40));
        analyze_document(&text, &llm, &small()).await.unwrap();

        let prompts = llm.prompts();
        assert!(prompts[1].contains("SUMMARY TEXT"));
        assert!(!prompts[1].contains("TAIL"));
        // Key information only sees the first chunk.
        assert!(!prompts[2].contains("TAIL"));
    }

    #[tokio::test]
    async fn malformed_replies_degrade() {
        let llm = Scripted::new(vec![Ok("Summary."), Ok("not json"), Ok("[1, 2]")]);
        let analysis = analyze_document("short", &llm, &small()).await.unwrap();
        assert_eq!(analysis.document_type, DocumentType::default());
        assert!(analysis.key_information.is_empty());
    }

    #[tokio::test]
    async fn failed_summary_is_fatal() {
        let llm = Scripted::new(vec![Err(ProviderError::RequestFailed("down".into()))]);
        assert!(analyze_document("short", &llm, &small()).await.is_err());
    }

    #[test]
    fn document_type_defaults_label() {
        let t = parse_document_type(r#"{"explanation": "looks like a will"}"#);
        assert_eq!(t.document_type, "Legal Document");
        assert_eq!(t.explanation, "looks like a will");
    }

    #[test]
    fn key_information_formatting() {
        let info = parse_key_information(
            r#"{"parties": {"buyer": "Acme"}, "price": 10, "dates": ["May 1", "May 9"]}"#,
        );
        let rendered = format_key_information(&info);
        assert!(rendered.contains("- parties:\n  - buyer: Acme\n"));
        assert!(rendered.contains("- price: 10\n"));
        assert!(rendered.contains("- dates: May 1, May 9\n"));
    }
}
