use super::{ScoredDoc, Scorer};
use crate::document::DocId;
use crate::index::InvertedIndex;

/// Okapi BM25 over the indexed fields.
pub struct Bm25Scorer<'a> {
    index: &'a InvertedIndex,
    k1: f32,
    b: f32,
}

impl<'a> Bm25Scorer<'a> {
    pub fn new(index: &'a InvertedIndex, k1: f32, b: f32) -> Self {
        Self { index, k1, b }
    }

    fn score_one(&self, idfs: &[(&str, f32)], doc_id: DocId) -> f32 {
        let dl = self.index.doc_len(doc_id) as f32;
        let avgdl = self.index.avg_doc_len();
        idfs.iter()
            .map(|(term, idf)| {
                let tf = self.index.tf(term, doc_id) as f32;
                idf * term_weight(tf, dl, avgdl, self.k1, self.b)
            })
            .sum()
    }
}

/// idf = ln((N - df + 0.5) / (df + 0.5) + 1); never negative.
pub fn bm25_idf(num_docs: u32, df: u32) -> f32 {
    let (n, df) = (num_docs as f32, df as f32);
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Saturated, length-normalized term frequency.
pub fn term_weight(tf: f32, dl: f32, avgdl: f32, k1: f32, b: f32) -> f32 {
    if tf <= 0.0 {
        return 0.0;
    }
    let rel_len = if avgdl > 0.0 { dl / avgdl } else { 1.0 };
    (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * rel_len))
}

impl Scorer for Bm25Scorer<'_> {
    /// Sums over the query sequence as given, so a repeated query term counts
    /// once per occurrence.
    fn score(&self, query: &[String], candidates: &[DocId]) -> Vec<ScoredDoc> {
        let n = self.index.num_docs();
        let idfs: Vec<(&str, f32)> = query
            .iter()
            .filter_map(|t| self.index.entry(t).map(|e| (t.as_str(), bm25_idf(n, e.df))))
            .collect();
        candidates
            .iter()
            .map(|&doc_id| ScoredDoc { doc_id, score: self.score_one(&idfs, doc_id) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BM25_B, BM25_K1};
    use crate::document::{doc, DocumentStore};
    use crate::index::IndexOptions;

    #[test]
    fn idf_stays_positive_for_common_terms() {
        assert!(bm25_idf(10, 10) > 0.0);
        assert!(bm25_idf(10, 1) > bm25_idf(10, 5));
    }

    #[test]
    fn non_decreasing_in_tf() {
        let mut prev = 0.0;
        for tf in 0..20 {
            let w = term_weight(tf as f32, 10.0, 8.0, BM25_K1, BM25_B);
            assert!(w >= prev);
            prev = w;
        }
    }

    #[test]
    fn decreasing_in_length_above_average() {
        let avgdl = 10.0;
        let mut prev = f32::INFINITY;
        for dl in [11.0, 15.0, 30.0, 100.0] {
            let w = term_weight(3.0, dl, avgdl, BM25_K1, BM25_B);
            assert!(w < prev);
            prev = w;
        }
    }

    #[test]
    fn formula_matches_hand_computation() {
        // N = 3, df(red) = 2, tf = 1, |d| = 2, avgdl = 7/3.
        let store = DocumentStore::from_documents(vec![
            doc("d1", &["red", "shoe"]),
            doc("d2", &["blue", "shoe"]),
            doc("d3", &["red", "shirt", "red"]),
        ])
        .unwrap();
        let idx = InvertedIndex::build(&store, &IndexOptions::default());
        let scored = Bm25Scorer::new(&idx, 1.5, 0.75).score(&["red".to_string()], &[0]);
        let idf = ((3.0f32 - 2.0 + 0.5) / (2.0 + 0.5) + 1.0).ln();
        let tfw = 2.5 / (1.0 + 1.5 * (0.25 + 0.75 * 2.0 / (7.0 / 3.0)));
        assert!((scored[0].score - idf * tfw).abs() < 1e-5);
    }

    #[test]
    fn unknown_terms_contribute_nothing() {
        let store = DocumentStore::from_documents(vec![doc("d1", &["red"]), doc("d2", &["blue"])]).unwrap();
        let idx = InvertedIndex::build(&store, &IndexOptions::default());
        let scorer = Bm25Scorer::new(&idx, BM25_K1, BM25_B);
        let with = scorer.score(&["red".to_string(), "purple".to_string()], &[0]);
        let without = scorer.score(&["red".to_string()], &[0]);
        assert_eq!(with[0].score, without[0].score);
    }
}
