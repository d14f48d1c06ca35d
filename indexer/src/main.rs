use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use shopsearch_core::config::{BM25_B, BM25_K1, DEFAULT_LIMIT, DEFAULT_STOCK_PENALTY};
use shopsearch_core::corpus::load_corpus;
use shopsearch_core::eval::{evaluate_model, EvaluationSummary, JudgedQuery, JudgmentRecord};
use shopsearch_core::{IndexOptions, ScoringConfig, ScoringModel, SearchEngine, WordVectors};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Index a product catalog in memory and search or evaluate it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CorpusArgs {
    /// Corpus path (JSON/JSONL file or a directory of them)
    #[arg(long)]
    corpus: PathBuf,
    /// Word vectors in word2vec/GloVe text format, enables the embedding model
    #[arg(long)]
    embeddings: Option<PathBuf>,
    /// Threads used to build the index
    #[arg(long, default_value_t = 1)]
    workers: usize,
    #[arg(long, default_value_t = BM25_K1)]
    k1: f32,
    #[arg(long, default_value_t = BM25_B)]
    b: f32,
    /// Subtracted from hybrid scores of out-of-stock products
    #[arg(long, default_value_t = DEFAULT_STOCK_PENALTY)]
    stock_penalty: f32,
}

#[derive(Subcommand)]
enum Commands {
    /// Print corpus and index statistics
    Stats {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Run one conjunctive query
    Search {
        #[command(flatten)]
        corpus: CorpusArgs,
        #[arg(long)]
        query: String,
        /// tfidf | bm25 | hybrid | embedding
        #[arg(long, default_value = "bm25")]
        model: ScoringModel,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        k: usize,
    },
    /// Score rankings against relevance judgments
    Evaluate {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// JSON array of {query_id, query, relevant}
        #[arg(long)]
        judgments: PathBuf,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        k: usize,
        /// Evaluate a single model instead of every available one
        #[arg(long)]
        model: Option<ScoringModel>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { corpus } => stats(&open_engine(&corpus)?),
        Commands::Search { corpus, query, model, k } => search(&open_engine(&corpus)?, &query, model, k),
        Commands::Evaluate { corpus, judgments, k, model } => {
            evaluate(&open_engine(&corpus)?, &judgments, k, model)
        }
    }
}

fn open_engine(args: &CorpusArgs) -> Result<SearchEngine> {
    let store = load_corpus(&args.corpus).with_context(|| format!("loading corpus from {}", args.corpus.display()))?;
    let config = ScoringConfig { k1: args.k1, b: args.b, stock_penalty: args.stock_penalty, ..Default::default() };
    let mut engine = SearchEngine::build(store, &IndexOptions::default(), config, args.workers);
    if let Some(path) = &args.embeddings {
        let file = File::open(path).with_context(|| format!("opening word vectors {}", path.display()))?;
        let vectors = WordVectors::read_text(BufReader::new(file))?;
        engine = engine.with_embeddings(vectors);
    }
    Ok(engine)
}

fn stats(engine: &SearchEngine) -> Result<()> {
    let index = engine.index();
    let out = serde_json::json!({
        "num_docs": index.num_docs(),
        "num_terms": index.num_terms(),
        "avg_doc_len": index.avg_doc_len(),
        "fields": index.fields(),
        "models": engine.models(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn search(engine: &SearchEngine, query: &str, model: ScoringModel, k: usize) -> Result<()> {
    let ranked = engine.search_text(query, model, k)?;
    tracing::info!(query, %model, hits = ranked.len(), "search complete");
    for (rank, hit) in ranked.iter().enumerate() {
        let Some(doc) = engine.store().get(hit.doc_id) else { continue };
        let line = serde_json::json!({
            "rank": rank + 1,
            "pid": doc.pid,
            "doc_id": hit.doc_id,
            "score": hit.score,
            "title": doc.title,
        });
        println!("{line}");
    }
    Ok(())
}

#[derive(Serialize)]
struct ModelReport {
    model: ScoringModel,
    #[serde(flatten)]
    summary: EvaluationSummary,
}

#[derive(Serialize)]
struct EvaluationReport {
    generated_at: String,
    num_docs: u32,
    models: Vec<ModelReport>,
}

fn evaluate(engine: &SearchEngine, judgments: &Path, k: usize, model: Option<ScoringModel>) -> Result<()> {
    let file = File::open(judgments).with_context(|| format!("opening judgments {}", judgments.display()))?;
    let records: Vec<JudgmentRecord> = serde_json::from_reader(BufReader::new(file))?;
    let queries: Vec<JudgedQuery> = records.iter().map(|r| r.resolve(engine.store())).collect();

    let models = match model {
        Some(m) => vec![m],
        None => engine.models(),
    };
    let mut reports = Vec::with_capacity(models.len());
    for model in models {
        let summary = evaluate_model(engine, &queries, model, k)?;
        reports.push(ModelReport { model, summary });
    }

    let report = EvaluationReport {
        generated_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        num_docs: engine.index().num_docs(),
        models: reports,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
