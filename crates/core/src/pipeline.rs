//! Wires configured providers and extractors into [`Services`].

use crate::config::AppConfig;
use crate::extractors::{LlmExtractor, PatternExtractor, SpanExtractor, TaggerExtractor};
use crate::session::Services;
use providers::hashing::HashingEmbedder;
use providers::lmstudio::{LmStudioConfig, LmStudioProvider};
use providers::ner::HttpNerProvider;
use providers::noop::NoopProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::ProviderRegistry;
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const REMOTE_EMBEDDERS: [&str; 2] = ["openai", "lmstudio"];
const OFFLINE_EMBEDDER: &str = "hashing";

pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new()
        .with_embedding("noop", Arc::new(NoopProvider))
        .with_embedding(
            "hashing",
            Arc::new(HashingEmbedder::new(config.embeddings.dimension)),
        )
        .with_llm("noop", Arc::new(NoopProvider));

    if let Some(key) = std::env::var_os("OPENAI_API_KEY") {
        let base = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: key.to_string_lossy().into_owned(),
            base_url: base,
            embedding_model: config.embeddings.model.clone(),
            chat_model: config.llm.model.clone(),
        });
        reg = reg
            .with_embedding("openai", Arc::new(provider.clone()))
            .with_llm("openai", Arc::new(provider));
    }

    if let Some(base) = std::env::var_os("LMSTUDIO_BASE_URL") {
        let provider = LmStudioProvider::new(LmStudioConfig {
            base_url: base.to_string_lossy().into_owned(),
            embedding_model: config.embeddings.model.clone(),
            chat_model: config.llm.model.clone(),
        });
        reg = reg
            .with_embedding("lmstudio", Arc::new(provider.clone()))
            .with_llm("lmstudio", Arc::new(provider));
    }

    if let Some(url) = &config.ner.url {
        reg = reg.with_tagger(Arc::new(HttpNerProvider::new(url.clone())));
    }

    let embedder = match &config.embeddings.provider {
        Some(name) => name.clone(),
        None => default_embedder(&reg, &config.llm.provider).to_string(),
    };
    debug!(embedder = %embedder, llm = %config.llm.provider, "providers selected");
    reg.set_preferred_embedding(&embedder)
        .set_preferred_llm(&config.llm.provider)
}

/// Remote embedders win over the offline one; the language model's own
/// backend is tried first.
pub fn default_embedder<'a>(registry: &ProviderRegistry, llm_provider: &'a str) -> &'a str {
    if REMOTE_EMBEDDERS.iter().any(|name| *name == llm_provider)
        && registry.has_embedding(llm_provider)
    {
        return llm_provider;
    }
    REMOTE_EMBEDDERS
        .into_iter()
        .find(|name| registry.has_embedding(name))
        .unwrap_or(OFFLINE_EMBEDDER)
}

/// Pattern matching always runs; the tagger and the language model join
/// when available.
pub fn build_extractors(
    config: &AppConfig,
    registry: &ProviderRegistry,
) -> Vec<Arc<dyn SpanExtractor>> {
    let mut extractors: Vec<Arc<dyn SpanExtractor>> = Vec::new();
    if let Some(tagger) = registry.tagger() {
        extractors.push(Arc::new(TaggerExtractor::new(tagger)));
    }
    extractors.push(Arc::new(PatternExtractor::new()));
    if config.extraction.use_llm {
        match registry.llm(None) {
            Ok(llm) => extractors.push(Arc::new(LlmExtractor::new(llm, &config.extraction))),
            Err(err) => warn!(error = %err, "language model extraction disabled"),
        }
    }
    debug!(
        extractors = ?extractors.iter().map(|e| e.name().to_string()).collect::<Vec<_>>(),
        "extractors configured"
    );
    extractors
}

pub fn build_services(config: AppConfig) -> Services {
    let registry = build_registry(&config);
    let extractors = build_extractors(&config, &registry);
    Services {
        registry,
        extractors,
        config,
    }
}
