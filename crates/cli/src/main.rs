use anyhow::{bail, Result};
use casefile_core::config::{self, AppConfig};
use casefile_core::text::truncate_words;
use casefile_core::{chat, loader, pipeline, search, DocumentSession};
use clap::{Parser, Subcommand};
use cli::{render, store};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(cli::log_filter())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            file,
            json,
            html,
            no_save,
        } => run_analyze(cfg, &file, json, html.as_deref(), no_save).await,
        Commands::Entities { id, json, html } => {
            run_entities(cfg, id, json, html.as_deref()).await
        }
        Commands::Search { id, query, top_k } => run_search(cfg, id, &query, top_k).await,
        Commands::Ask { id, question } => run_ask(cfg, id, &question).await,
        Commands::Info { question } => run_info(cfg, &question).await,
        Commands::List { json, limit } => run_list(cfg, json, limit).await,
        Commands::Show { id, json } => run_show(cfg, id, json).await,
        Commands::History { id, json, limit } => run_history(cfg, id, json, limit).await,
        Commands::Delete { id } => run_delete(cfg, id).await,
    }
}

#[derive(Parser)]
#[command(name = "casefile")]
#[command(about = "Legal document analysis, entity extraction and Q&A", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a document, extract entities and store the result
    Analyze {
        /// Document to analyse (.txt, .md; .pdf and .docx with features)
        file: PathBuf,
        /// Output JSON
        #[arg(long)]
        json: bool,
        /// Write the highlighted document as HTML
        #[arg(long)]
        html: Option<PathBuf>,
        /// Do not persist the analysis
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Show the stored entities of a document
    Entities {
        id: i64,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Print the context retrieved for a query
    Search {
        id: i64,
        query: String,
        /// Number of chunks (defaults to retrieval.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Ask a question about a stored document
    Ask { id: i64, question: String },
    /// General legal information, no document needed
    Info { question: String },
    /// List stored documents
    List {
        #[arg(long)]
        json: bool,
        /// Newest documents to show
        #[arg(short = 'n', long, default_value_t = storage::DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Show a stored document's analysis
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Show the chat history of a document
    History {
        id: i64,
        #[arg(long)]
        json: bool,
        /// Most recent exchanges to show
        #[arg(short = 'n', long, default_value_t = storage::DEFAULT_LIMIT)]
        limit: u32,
    },
    /// Delete a document with its entities and chat history
    Delete { id: i64 },
}

async fn run_analyze(
    cfg: AppConfig,
    file: &Path,
    json: bool,
    html: Option<&Path>,
    no_save: bool,
) -> Result<()> {
    let text = loader::load_text(file)?;
    if text.trim().is_empty() {
        bail!("{} contains no text", file.display());
    }
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());

    let database = cfg.database.path.clone();
    let services = pipeline::build_services(cfg);
    let session = DocumentSession::analyze(&name, text, &services).await?;

    let id = if no_save {
        None
    } else {
        let pool = store::open(&database).await?;
        let id = store::save_session(&pool, &session).await?;
        tracing::info!(id, entities = session.entities.len(), "analysis stored");
        Some(id)
    };
    if let Some(out) = html {
        std::fs::write(out, session.highlighted_html())?;
    }

    if json {
        let out = serde_json::json!({
            "id": id,
            "filename": session.name,
            "analysis": session.analysis,
            "entities": session.entities,
            "entity_counts": render::entity_counts(&session.entities),
            "sources": session.sources,
            "chunks": session.index().len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        match id {
            Some(id) => println!("document {id}: {}", session.name),
            None => println!("document (not saved): {}", session.name),
        }
        println!("{}", render::analysis(&session.analysis));
        print!("{}", render::entities(&session.entities));
        println!("sources: {}", render::sources(&session.sources));
        println!("indexed chunks: {}", session.index().len());
    }
    Ok(())
}

async fn run_entities(cfg: AppConfig, id: i64, json: bool, html: Option<&Path>) -> Result<()> {
    let pool = store::open(&cfg.database.path).await?;
    let Some(doc) = storage::get_document(&pool, id).await? else {
        bail!("document {id} not found");
    };
    let spans: Vec<_> = storage::get_entities(&pool, id)
        .await?
        .iter()
        .map(store::span_of)
        .collect();
    if let Some(out) = html {
        std::fs::write(
            out,
            casefile_core::highlight::highlight_html(&doc.document_text, &spans),
        )?;
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&spans)?);
    } else {
        print!("{}", render::entities(&spans));
    }
    Ok(())
}

async fn run_search(cfg: AppConfig, id: i64, query: &str, top_k: Option<usize>) -> Result<()> {
    let pool = store::open(&cfg.database.path).await?;
    let services = pipeline::build_services(cfg);
    let Some(session) = store::load_session(&pool, id, &services).await? else {
        bail!("document {id} not found");
    };
    let embeddings = services.embeddings()?;
    let k = top_k.unwrap_or(services.config.retrieval.top_k);
    let hits = search::retrieve(query, session.index(), embeddings.as_ref(), k).await?;
    if hits.is_empty() {
        println!(
            "no chunks retrieved; the first {} characters would be used",
            services.config.retrieval.fallback_chars
        );
        return Ok(());
    }
    for hit in hits {
        println!(
            "#{} [{}..{}] distance {:.4}\n{}\n",
            hit.chunk.index, hit.chunk.start, hit.chunk.end, hit.distance, hit.chunk.text
        );
    }
    Ok(())
}

async fn run_ask(cfg: AppConfig, id: i64, question: &str) -> Result<()> {
    let pool = store::open(&cfg.database.path).await?;
    let services = pipeline::build_services(cfg);
    let Some(mut session) = store::load_session(&pool, id, &services).await? else {
        bail!("document {id} not found");
    };
    let reply = session.ask(question, &services).await?;
    storage::save_chat_message(&pool, id, question, &reply).await?;
    println!("{reply}");
    Ok(())
}

async fn run_info(cfg: AppConfig, question: &str) -> Result<()> {
    let services = pipeline::build_services(cfg);
    let llm = services.llm()?;
    let reply = chat::general_information(question, llm.as_ref()).await?;
    println!("{reply}");
    Ok(())
}

async fn run_list(cfg: AppConfig, json: bool, limit: u32) -> Result<()> {
    let pool = store::open(&cfg.database.path).await?;
    let docs = storage::list_documents(&pool, Some(limit)).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
        return Ok(());
    }
    if docs.is_empty() {
        println!("no documents");
    }
    for doc in docs {
        let label = store::stored_document_type(doc.document_type.as_deref()).document_type;
        println!(
            "{:>4}  {}  {}  {}",
            doc.id,
            render::timestamp(doc.upload_date),
            label,
            doc.filename
        );
    }
    Ok(())
}

async fn run_show(cfg: AppConfig, id: i64, json: bool) -> Result<()> {
    let pool = store::open(&cfg.database.path).await?;
    let Some(doc) = storage::get_document(&pool, id).await? else {
        bail!("document {id} not found");
    };
    let analysis = store::stored_analysis(&doc);
    if json {
        let out = serde_json::json!({
            "id": doc.id,
            "filename": doc.filename,
            "upload_date": doc.upload_date,
            "analysis": analysis,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "document {}: {} ({})",
            doc.id,
            doc.filename,
            render::timestamp(doc.upload_date)
        );
        println!("{}", render::analysis(&analysis));
        println!("Text:\n{}", truncate_words(&doc.document_text, 1000));
    }
    Ok(())
}

async fn run_history(cfg: AppConfig, id: i64, json: bool, limit: u32) -> Result<()> {
    let pool = store::open(&cfg.database.path).await?;
    let messages = storage::get_chat_history(&pool, id, Some(limit)).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }
    for m in messages {
        println!("[{}] Q: {}", render::timestamp(m.timestamp), m.user_query);
        println!("A: {}\n", m.assistant_response);
    }
    Ok(())
}

async fn run_delete(cfg: AppConfig, id: i64) -> Result<()> {
    let pool = store::open(&cfg.database.path).await?;
    if storage::delete_document(&pool, id).await? {
        println!("deleted document {id}");
    } else {
        bail!("document {id} not found");
    }
    Ok(())
}
