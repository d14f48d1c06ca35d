//! Ranking-quality metrics against relevance judgments.
//!
//! Every metric is defined to be 0 when there is nothing to measure (empty
//! ranking, no relevant documents, K = 0) rather than dividing by zero.

use crate::document::{DocId, DocumentStore};
use crate::engine::SearchEngine;
use crate::error::Result;
use crate::scoring::{ScoredDoc, ScoringModel};
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Relevance grades for one query. Grade > 0 means relevant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Judgment {
    grades: HashMap<DocId, f64>,
}

impl Judgment {
    pub fn binary<I: IntoIterator<Item = DocId>>(relevant: I) -> Self {
        Self { grades: relevant.into_iter().map(|id| (id, 1.0)).collect() }
    }

    pub fn graded<I: IntoIterator<Item = (DocId, f64)>>(grades: I) -> Self {
        Self { grades: grades.into_iter().collect() }
    }

    pub fn grade(&self, doc_id: DocId) -> f64 {
        self.grades.get(&doc_id).copied().unwrap_or(0.0)
    }

    pub fn is_relevant(&self, doc_id: DocId) -> bool {
        self.grade(doc_id) > 0.0
    }

    pub fn num_relevant(&self) -> usize {
        self.grades.values().filter(|g| **g > 0.0).count()
    }

    /// Positive grades, best first.
    fn ideal_grades(&self) -> Vec<f64> {
        let mut g: Vec<f64> = self.grades.values().copied().filter(|g| *g > 0.0).collect();
        g.sort_by(|a, b| b.total_cmp(a));
        g
    }
}

fn hits_at_k(ranking: &[DocId], judgment: &Judgment, k: usize) -> usize {
    ranking.iter().take(k).filter(|id| judgment.is_relevant(**id)).count()
}

pub fn precision_at_k(ranking: &[DocId], judgment: &Judgment, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits_at_k(ranking, judgment, k) as f64 / k as f64
}

pub fn recall_at_k(ranking: &[DocId], judgment: &Judgment, k: usize) -> f64 {
    let total = judgment.num_relevant();
    if total == 0 {
        return 0.0;
    }
    hits_at_k(ranking, judgment, k) as f64 / total as f64
}

pub fn f1_at_k(ranking: &[DocId], judgment: &Judgment, k: usize) -> f64 {
    let p = precision_at_k(ranking, judgment, k);
    let r = recall_at_k(ranking, judgment, k);
    if p + r == 0.0 {
        return 0.0;
    }
    2.0 * p * r / (p + r)
}

/// Retrieved-but-irrelevant documents among the top `k`.
pub fn false_positives_at_k(ranking: &[DocId], judgment: &Judgment, k: usize) -> usize {
    ranking.len().min(k) - hits_at_k(ranking, judgment, k)
}

/// Mean of precision@i over the ranks i <= k holding a relevant document.
pub fn average_precision_at_k(ranking: &[DocId], judgment: &Judgment, k: usize) -> f64 {
    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, id) in ranking.iter().take(k).enumerate() {
        if judgment.is_relevant(*id) {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    if hits == 0 {
        return 0.0;
    }
    sum / hits as f64
}

/// 1 / rank of the first relevant document within the top `k`.
pub fn reciprocal_rank_at_k(ranking: &[DocId], judgment: &Judgment, k: usize) -> f64 {
    ranking
        .iter()
        .take(k)
        .position(|id| judgment.is_relevant(*id))
        .map_or(0.0, |i| 1.0 / (i + 1) as f64)
}

fn discounted_gain<I: IntoIterator<Item = f64>>(grades: I) -> f64 {
    grades
        .into_iter()
        .enumerate()
        .map(|(i, rel)| rel / ((i + 2) as f64).log2())
        .sum()
}

pub fn dcg_at_k(ranking: &[DocId], judgment: &Judgment, k: usize) -> f64 {
    discounted_gain(ranking.iter().take(k).map(|id| judgment.grade(*id).max(0.0)))
}

pub fn ndcg_at_k(ranking: &[DocId], judgment: &Judgment, k: usize) -> f64 {
    let idcg = discounted_gain(judgment.ideal_grades().into_iter().take(k));
    if idcg <= 0.0 {
        return 0.0;
    }
    dcg_at_k(ranking, judgment, k) / idcg
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMetrics {
    pub query_id: String,
    pub retrieved: usize,
    pub relevant: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub average_precision: f64,
    pub reciprocal_rank: f64,
    pub ndcg: f64,
    pub false_positives: usize,
}

impl QueryMetrics {
    pub fn compute(query_id: impl Into<String>, ranking: &[DocId], judgment: &Judgment, k: usize) -> Self {
        Self {
            query_id: query_id.into(),
            retrieved: ranking.len().min(k),
            relevant: judgment.num_relevant(),
            precision: precision_at_k(ranking, judgment, k),
            recall: recall_at_k(ranking, judgment, k),
            f1: f1_at_k(ranking, judgment, k),
            average_precision: average_precision_at_k(ranking, judgment, k),
            reciprocal_rank: reciprocal_rank_at_k(ranking, judgment, k),
            ndcg: ndcg_at_k(ranking, judgment, k),
            false_positives: false_positives_at_k(ranking, judgment, k),
        }
    }

    pub fn from_scored(query_id: impl Into<String>, ranking: &[ScoredDoc], judgment: &Judgment, k: usize) -> Self {
        let ids: Vec<DocId> = ranking.iter().map(|s| s.doc_id).collect();
        Self::compute(query_id, &ids, judgment, k)
    }

    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1", self.f1),
            ("average_precision", self.average_precision),
            ("reciprocal_rank", self.reciprocal_rank),
            ("ndcg", self.ndcg),
            ("false_positives", self.false_positives as f64),
        ])
    }
}

/// Corpus-level aggregates over a judged query set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub k: usize,
    pub num_queries: usize,
    pub map: f64,
    pub mrr: f64,
    pub mean_ndcg: f64,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub mean_f1: f64,
    pub queries: Vec<QueryMetrics>,
}

impl EvaluationSummary {
    pub fn from_queries(k: usize, queries: Vec<QueryMetrics>) -> Self {
        let mean = |f: fn(&QueryMetrics) -> f64| {
            if queries.is_empty() {
                0.0
            } else {
                queries.iter().map(f).sum::<f64>() / queries.len() as f64
            }
        };
        Self {
            k,
            num_queries: queries.len(),
            map: mean(|q| q.average_precision),
            mrr: mean(|q| q.reciprocal_rank),
            mean_ndcg: mean(|q| q.ndcg),
            mean_precision: mean(|q| q.precision),
            mean_recall: mean(|q| q.recall),
            mean_f1: mean(|q| q.f1),
            queries,
        }
    }
}

/// A query with its tokenized terms and judgment.
#[derive(Debug, Clone)]
pub struct JudgedQuery {
    pub query_id: String,
    pub terms: Vec<String>,
    pub judgment: Judgment,
}

/// Run every judged query through `model` and score the top `k`.
pub fn evaluate_model(
    engine: &SearchEngine,
    queries: &[JudgedQuery],
    model: ScoringModel,
    k: usize,
) -> Result<EvaluationSummary> {
    let mut per_query = Vec::with_capacity(queries.len());
    for q in queries {
        let ranking = engine.search(&q.terms, model, k)?;
        per_query.push(QueryMetrics::from_scored(q.query_id.clone(), &ranking, &q.judgment, k));
    }
    let summary = EvaluationSummary::from_queries(k, per_query);
    tracing::info!(%model, k, queries = summary.num_queries, map = summary.map, mrr = summary.mrr, ndcg = summary.mean_ndcg, "evaluation finished");
    Ok(summary)
}

/// Judgment list as written by annotators, keyed by external product id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RelevantDocs {
    Binary(Vec<String>),
    Graded(HashMap<String, f64>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgmentRecord {
    pub query_id: String,
    pub query: String,
    pub relevant: RelevantDocs,
}

impl JudgmentRecord {
    /// Tokenize the query text and map product ids to internal ids. Ids not
    /// present in the store are dropped.
    pub fn resolve(&self, store: &DocumentStore) -> JudgedQuery {
        let lookup = |pid: &str| {
            let id = store.id_of(pid);
            if id.is_none() {
                tracing::warn!(query_id = %self.query_id, pid, "judged document not in corpus");
            }
            id
        };
        let judgment = match &self.relevant {
            RelevantDocs::Binary(pids) => Judgment::binary(pids.iter().filter_map(|p| lookup(p.as_str()))),
            RelevantDocs::Graded(grades) => {
                Judgment::graded(grades.iter().filter_map(|(p, g)| lookup(p.as_str()).map(|id| (id, *g))))
            }
        };
        JudgedQuery { query_id: self.query_id.clone(), terms: tokenize(&self.query), judgment }
    }
}
