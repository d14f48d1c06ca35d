//! Product-catalog retrieval: positional inverted index, conjunctive query
//! evaluation, four ranking models and ranking-quality metrics.

pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod eval;
pub mod index;
pub mod query;
pub mod scoring;
pub mod tokenizer;

pub use config::ScoringConfig;
pub use document::{DocId, Document, DocumentStore, Field, FieldTokens, NumericAttributes};
pub use embedding::{EmbeddingLookup, WordVectors};
pub use engine::SearchEngine;
pub use error::{Error, Result};
pub use index::{IndexOptions, InvertedIndex, Posting, TermEntry};
pub use scoring::{ScoredDoc, ScoringModel};
