use super::{ScoredDoc, Scorer};
use crate::document::{DocId, DocumentStore, Field};
use crate::embedding::EmbeddingLookup;

/// Mean of the vectors of `tokens` found in `lookup`.
///
/// Unknown tokens and vectors of the wrong dimension are skipped; `None` when
/// nothing resolved.
pub fn mean_vector<'t, I>(lookup: &dyn EmbeddingLookup, tokens: I) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'t str>,
{
    let dim = lookup.dim();
    let mut sum = vec![0.0f32; dim];
    let mut count = 0usize;
    for token in tokens {
        let Some(v) = lookup.vector(token) else { continue };
        if v.len() != dim {
            tracing::warn!(token, expected = dim, got = v.len(), "ignoring word vector with wrong dimension");
            continue;
        }
        for (s, x) in sum.iter_mut().zip(v) {
            *s += x;
        }
        count += 1;
    }
    if count == 0 || dim == 0 {
        return None;
    }
    let n = count as f32;
    sum.iter_mut().for_each(|s| *s /= n);
    Some(sum)
}

/// Per-document mean vectors, computed once per lookup.
#[derive(Debug, Default)]
pub struct DocumentVectors {
    vectors: Vec<Option<Vec<f32>>>,
}

impl DocumentVectors {
    pub fn build(store: &DocumentStore, fields: &[Field], lookup: &dyn EmbeddingLookup) -> Self {
        let vectors: Vec<Option<Vec<f32>>> = store
            .iter()
            .map(|(_, doc)| mean_vector(lookup, doc.tokens.iter_fields(fields).map(String::as_str)))
            .collect();
        let unresolved = vectors.iter().filter(|v| v.is_none()).count();
        tracing::info!(num_docs = vectors.len(), unresolved, "document embeddings computed");
        Self { vectors }
    }

    pub fn get(&self, doc_id: DocId) -> Option<&[f32]> {
        self.vectors.get(doc_id as usize).and_then(|v| v.as_deref())
    }
}

/// Cosine between the query's mean word vector and each document's.
pub struct EmbeddingScorer<'a> {
    lookup: &'a dyn EmbeddingLookup,
    docs: &'a DocumentVectors,
}

impl<'a> EmbeddingScorer<'a> {
    pub fn new(lookup: &'a dyn EmbeddingLookup, docs: &'a DocumentVectors) -> Self {
        Self { lookup, docs }
    }
}

impl Scorer for EmbeddingScorer<'_> {
    fn score(&self, query: &[String], candidates: &[DocId]) -> Vec<ScoredDoc> {
        let q = mean_vector(self.lookup, query.iter().map(String::as_str));
        if q.is_none() {
            tracing::debug!("no query term has a word vector");
        }
        candidates
            .iter()
            .map(|&doc_id| {
                let score = match (&q, self.docs.get(doc_id)) {
                    (Some(q), Some(d)) => super::cosine(q, d),
                    _ => 0.0,
                };
                ScoredDoc { doc_id, score }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::doc;
    use crate::embedding::WordVectors;

    fn vectors() -> WordVectors {
        WordVectors::from_entries(vec![
            ("red", vec![1.0, 0.0, 0.0]),
            ("shoe", vec![0.0, 1.0, 0.0]),
            ("shirt", vec![0.0, 0.0, 1.0]),
        ])
    }

    #[test]
    fn mean_skips_unknown_tokens() {
        let wv = vectors();
        let m = mean_vector(&wv, ["red", "zzz", "shoe"]).unwrap();
        assert_eq!(m, vec![0.5, 0.5, 0.0]);
        assert!(mean_vector(&wv, ["zzz"]).is_none());
    }

    #[test]
    fn identical_token_bags_score_one() {
        let wv = vectors();
        let store = DocumentStore::from_documents(vec![doc("a", &["red", "shoe"]), doc("b", &["shirt"])]).unwrap();
        let docs = DocumentVectors::build(&store, &Field::ALL, &wv);
        let scorer = EmbeddingScorer::new(&wv, &docs);
        let scored = scorer.score(&["shoe".to_string(), "red".to_string()], &[0, 1]);
        assert!((scored[0].score - 1.0).abs() < 1e-6);
        assert!(scored[1].score.abs() < 1e-6);
    }

    #[test]
    fn unresolvable_query_or_document_scores_zero() {
        let wv = vectors();
        let store = DocumentStore::from_documents(vec![doc("a", &["red"]), doc("b", &["unknown"])]).unwrap();
        let docs = DocumentVectors::build(&store, &Field::ALL, &wv);
        let scorer = EmbeddingScorer::new(&wv, &docs);
        assert_eq!(scorer.score(&["nothing".to_string()], &[0])[0].score, 0.0);
        assert_eq!(scorer.score(&["red".to_string()], &[1])[0].score, 0.0);
    }
}
