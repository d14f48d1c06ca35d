use anyhow::Result;
use axum::Router;
use clap::Parser;
use server::{build_app, ServerConfig};
use shopsearch_core::config::{BM25_B, BM25_K1, DEFAULT_STOCK_PENALTY};
use shopsearch_core::ScoringConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus path (JSON/JSONL file or a directory of them)
    #[arg(long, default_value = "./data")]
    corpus: PathBuf,
    /// Word vectors in word2vec/GloVe text format
    #[arg(long)]
    embeddings: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Threads used to build the index at startup
    #[arg(long, default_value_t = 4)]
    workers: usize,
    #[arg(long, default_value_t = BM25_K1)]
    k1: f32,
    #[arg(long, default_value_t = BM25_B)]
    b: f32,
    #[arg(long, default_value_t = DEFAULT_STOCK_PENALTY)]
    stock_penalty: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let cfg = ServerConfig {
        corpus: args.corpus,
        embeddings: args.embeddings,
        scoring: ScoringConfig { k1: args.k1, b: args.b, stock_penalty: args.stock_penalty, ..Default::default() },
        workers: args.workers,
    };
    let app: Router = build_app(&cfg)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
