use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub ner: NerConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/casefile.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Unset picks a remote embedder when one is registered, else `hashing`.
    pub provider: Option<String>,
    pub model: String,
    pub batch_size: usize,
    /// Vector size of the offline `hashing` provider.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: "text-embedding-3-small".to_string(),
            batch_size: 16,
            dimension: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NerConfig {
    /// Base URL of the statistical tagger service; disabled when unset.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub fallback_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            fallback_chars: 3000,
        }
    }
}

/// Which literal matches of a language-model entity become spans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occurrences {
    #[default]
    All,
    First,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub llm_max_chars: usize,
    pub occurrences: Occurrences,
    pub use_llm: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            llm_max_chars: 10_000,
            occurrences: Occurrences::All,
            use_llm: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub summary_max_chars: usize,
    pub classify_max_chars: usize,
    pub key_info_max_chars: usize,
    pub long_document_chars: usize,
    pub key_info_chunk_size: usize,
    pub key_info_chunk_overlap: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            summary_max_chars: 14_000,
            classify_max_chars: 12_000,
            key_info_max_chars: 12_000,
            long_document_chars: 8_000,
            key_info_chunk_size: 4_000,
            key_info_chunk_overlap: 200,
        }
    }
}

/// Loads the optional config file, then `CASEFILE__*` environment overrides
/// (e.g. `CASEFILE__CHUNKING__CHUNK_SIZE=800`).
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("CASEFILE")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.chunking, ChunkingConfig::default());
        assert_eq!(cfg.retrieval.top_k, 3);
        assert_eq!(cfg.retrieval.fallback_chars, 3000);
        assert_eq!(cfg.extraction.occurrences, Occurrences::All);
        assert_eq!(cfg.embeddings.provider, None);
    }

    #[test]
    fn file_values_override_defaults() {
        let temp = std::env::temp_dir().join(format!("casefile-config-{}.toml", std::process::id()));
        std::fs::write(
            &temp,
            "[chunking]\nchunk_size = 500\n\n[extraction]\noccurrences = \"first\"\n",
        )
        .unwrap();
        let cfg = load(Some(&temp.to_string_lossy())).unwrap();
        std::fs::remove_file(&temp).ok();
        assert_eq!(cfg.chunking.chunk_size, 500);
        assert_eq!(cfg.chunking.overlap, 100);
        assert_eq!(cfg.extraction.occurrences, Occurrences::First);
    }
}
