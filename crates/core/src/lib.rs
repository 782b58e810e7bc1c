//! Core library: document analysis, legal entity extraction and resolution,
//! chunk indexing and context retrieval.

pub mod analysis;
pub mod chat;
pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod extractors;
pub mod highlight;
pub mod indexer;
pub mod llm_json;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod resolver;
pub mod search;
pub mod session;
pub mod text;
pub mod vectorstore;

pub use models::{EntityType, Span};
pub use session::{DocumentSession, Services};
