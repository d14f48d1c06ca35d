pub mod analytics;

use analytics::SearchLog;
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shopsearch_core::config::{DEFAULT_LIMIT, MAX_LIMIT};
use shopsearch_core::corpus::load_corpus;
use shopsearch_core::query::conjunctive_candidates;
use shopsearch_core::tokenizer::tokenize;
use shopsearch_core::{DocId, Error as CoreError, IndexOptions, ScoringConfig, ScoringModel, SearchEngine, WordVectors};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_LIMIT }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub model: ScoringModel,
    pub search_id: u64,
    pub took_s: f64,
    /// Size of the conjunctive candidate set before truncation.
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub pid: String,
    pub score: f32,
    pub title: String,
    pub url: Option<String>,
    pub rating: Option<f32>,
    pub price: Option<f32>,
    pub discount: Option<f32>,
    pub out_of_stock: bool,
}

#[derive(Deserialize)]
pub struct DocParams {
    pub search_id: Option<u64>,
    pub rank: Option<usize>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub log: Arc<SearchLog>,
}

/// Where the server loads its session data from.
pub struct ServerConfig {
    pub corpus: std::path::PathBuf,
    pub embeddings: Option<std::path::PathBuf>,
    pub scoring: ScoringConfig,
    pub workers: usize,
}

pub fn load_engine(cfg: &ServerConfig) -> Result<SearchEngine> {
    let store = load_corpus(&cfg.corpus).with_context(|| format!("loading corpus from {}", cfg.corpus.display()))?;
    let mut engine = SearchEngine::build(store, &IndexOptions::default(), cfg.scoring, cfg.workers);
    if let Some(path) = &cfg.embeddings {
        let file = File::open(path).with_context(|| format!("opening word vectors {}", path.display()))?;
        engine = engine.with_embeddings(WordVectors::read_text(BufReader::new(file))?);
    }
    Ok(engine)
}

pub fn build_app(cfg: &ServerConfig) -> Result<Router> {
    Ok(router(Arc::new(load_engine(cfg)?)))
}

pub fn router(engine: Arc<SearchEngine>) -> Router {
    let app_state = AppState { engine, log: Arc::new(SearchLog::new()) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:pid", get(doc_handler))
        .route("/analytics", get(analytics_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let model: ScoringModel = match params.model.as_deref() {
        Some(m) => m.parse().map_err(|e: CoreError| (StatusCode::BAD_REQUEST, e.to_string()))?,
        None => ScoringModel::Bm25,
    };
    let k = params.k.clamp(1, MAX_LIMIT);

    let terms = tokenize(&params.q);
    let engine = &state.engine;
    let ranked = engine.search(&terms, model, k).map_err(|e| match e {
        CoreError::EmbeddingsUnavailable => (StatusCode::BAD_REQUEST, e.to_string()),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    })?;
    let total_hits = if ranked.is_empty() { 0 } else { conjunctive_candidates(engine.index(), &terms).len() };

    let results: Vec<SearchHit> = ranked
        .iter()
        .filter_map(|hit| {
            let doc = engine.store().get(hit.doc_id)?;
            Some(SearchHit {
                doc_id: hit.doc_id,
                pid: doc.pid.clone(),
                score: hit.score,
                title: doc.title.clone(),
                url: doc.url.clone(),
                rating: doc.numeric.average_rating,
                price: doc.numeric.selling_price,
                discount: doc.numeric.discount,
                out_of_stock: doc.numeric.is_out_of_stock(),
            })
        })
        .collect();

    let search_id = state.log.record_query(&params.q, terms.len(), model.as_str(), total_hits);
    let elapsed = start.elapsed();
    tracing::debug!(search_id, %model, total_hits, took_ms = elapsed.as_millis() as u64, "search served");
    Ok(Json(SearchResponse { query: params.q, model, search_id, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    Query(params): Query<DocParams>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let store = state.engine.store();
    let doc = store
        .id_of(&pid)
        .and_then(|id| store.get(id))
        .ok_or((StatusCode::NOT_FOUND, format!("unknown product {pid}")))?;
    if params.search_id.is_some() {
        state.log.record_click(params.search_id, &pid, params.rank);
    }
    Ok(Json(serde_json::json!({
        "pid": doc.pid,
        "title": doc.title,
        "url": doc.url,
        "numeric": doc.numeric,
        "tokens": doc.tokens,
    })))
}

pub async fn analytics_handler(State(state): State<AppState>) -> Json<analytics::AnalyticsSnapshot> {
    Json(state.log.snapshot())
}
