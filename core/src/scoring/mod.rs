//! Ranking models applied to a conjunctive candidate set.
//!
//! Each model scores the whole candidate set at once (the hybrid model
//! normalizes against it); [`rank`] turns the scores into the final order.

pub mod bm25;
pub mod embedding;
pub mod hybrid;
pub mod tfidf;

pub use bm25::Bm25Scorer;
pub use embedding::{DocumentVectors, EmbeddingScorer};
pub use hybrid::HybridScorer;
pub use tfidf::TfIdfScorer;

use crate::document::DocId;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringModel {
    TfIdf,
    Bm25,
    Hybrid,
    Embedding,
}

impl ScoringModel {
    pub const ALL: [ScoringModel; 4] = [
        ScoringModel::TfIdf,
        ScoringModel::Bm25,
        ScoringModel::Hybrid,
        ScoringModel::Embedding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringModel::TfIdf => "tfidf",
            ScoringModel::Bm25 => "bm25",
            ScoringModel::Hybrid => "hybrid",
            ScoringModel::Embedding => "embedding",
        }
    }
}

impl fmt::Display for ScoringModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tfidf" | "tf-idf" => Ok(ScoringModel::TfIdf),
            "bm25" => Ok(ScoringModel::Bm25),
            "hybrid" => Ok(ScoringModel::Hybrid),
            "embedding" | "word2vec" => Ok(ScoringModel::Embedding),
            _ => Err(Error::UnknownModel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

pub trait Scorer {
    /// One entry per candidate, in no particular order.
    fn score(&self, query: &[String], candidates: &[DocId]) -> Vec<ScoredDoc>;
}

/// Score descending, ties by ascending doc id.
pub fn rank(mut scored: Vec<ScoredDoc>, limit: usize) -> Vec<ScoredDoc> {
    scored.sort_by(ranking_order);
    scored.truncate(limit);
    scored
}

pub fn ranking_order(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
    b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id))
}

/// Cosine similarity; a zero-norm side scores 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        tracing::debug!(norm_a = na.sqrt(), norm_b = nb.sqrt(), "degenerate vector in cosine");
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_round_trip() {
        for m in ScoringModel::ALL {
            assert_eq!(m.as_str().parse::<ScoringModel>().unwrap(), m);
        }
        assert_eq!("TF-IDF".parse::<ScoringModel>().unwrap(), ScoringModel::TfIdf);
        assert!(matches!("lsi".parse::<ScoringModel>(), Err(Error::UnknownModel(_))));
    }

    #[test]
    fn ties_break_by_doc_id() {
        let scored = vec![
            ScoredDoc { doc_id: 5, score: 0.5 },
            ScoredDoc { doc_id: 2, score: 0.9 },
            ScoredDoc { doc_id: 1, score: 0.5 },
        ];
        let ids: Vec<DocId> = rank(scored, 10).iter().map(|s| s.doc_id).collect();
        assert_eq!(ids, vec![2, 1, 5]);
    }

    #[test]
    fn rank_truncates() {
        let scored = (0..5).map(|i| ScoredDoc { doc_id: i, score: i as f32 }).collect();
        let top = rank(scored, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].doc_id, 4);
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine(&[], &[]), 0.0);
    }
}
