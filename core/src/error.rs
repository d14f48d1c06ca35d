use thiserror::Error;

/// Failures surfaced to callers of the search core.
///
/// Per-term and per-document anomalies (unknown query terms, zero-norm
/// vectors, missing numeric attributes) are absorbed where they occur and
/// never show up here.
#[derive(Error, Debug)]
pub enum Error {
    /// Two corpus records share the same product id.
    #[error("duplicate document id: {0}")]
    DuplicateDocument(String),

    /// The embedding model was requested but no word-vector lookup is loaded.
    #[error("embedding model requested but no word vectors are loaded")]
    EmbeddingsUnavailable,

    /// A word-vector source could not be used at all.
    #[error("invalid embedding source: {0}")]
    InvalidEmbedding(String),

    /// Model identifier outside {tfidf, bm25, hybrid, embedding}.
    #[error("unknown scoring model: {0}")]
    UnknownModel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
