use super::{ScoredDoc, Scorer};
use crate::document::DocId;
use crate::index::InvertedIndex;

/// TF-IDF weights with cosine similarity over the query's term dimensions.
///
/// weight(t, d) = tf(t, d) * ln(N / df(t)); the query is weighted the same way
/// with tf taken as the term's count in the query. No length normalization
/// beyond the cosine itself.
pub struct TfIdfScorer<'a> {
    index: &'a InvertedIndex,
}

impl<'a> TfIdfScorer<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self { index }
    }

    pub fn idf(&self, term: &str) -> f32 {
        let df = self.index.df(term);
        if df == 0 {
            return 0.0;
        }
        (self.index.num_docs() as f32 / df as f32).ln()
    }

    /// Distinct query terms in first-seen order with their query weights.
    fn query_vector<'q>(&self, query: &'q [String]) -> Vec<(&'q str, f32)> {
        let mut counts: Vec<(&str, u32)> = Vec::new();
        for term in query {
            match counts.iter_mut().find(|(t, _)| *t == term.as_str()) {
                Some((_, c)) => *c += 1,
                None => counts.push((term.as_str(), 1)),
            }
        }
        counts
            .into_iter()
            .map(|(t, c)| (t, c as f32 * self.idf(t)))
            .collect()
    }

    fn score_one(&self, q: &[(&str, f32)], doc_id: DocId) -> f32 {
        let d: Vec<f32> = q
            .iter()
            .map(|(t, _)| self.index.tf(t, doc_id) as f32 * self.idf(t))
            .collect();
        let qv: Vec<f32> = q.iter().map(|(_, w)| *w).collect();
        super::cosine(&qv, &d)
    }
}

impl Scorer for TfIdfScorer<'_> {
    fn score(&self, query: &[String], candidates: &[DocId]) -> Vec<ScoredDoc> {
        let q = self.query_vector(query);
        candidates
            .iter()
            .map(|&doc_id| ScoredDoc { doc_id, score: self.score_one(&q, doc_id) })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{doc, DocumentStore};
    use crate::index::IndexOptions;

    fn q(terms: &[&str]) -> Vec<String> {
        terms.iter().map(|s| s.to_string()).collect()
    }

    fn index_of(docs: Vec<crate::document::Document>) -> InvertedIndex {
        InvertedIndex::build(&DocumentStore::from_documents(docs).unwrap(), &IndexOptions::default())
    }

    #[test]
    fn idf_is_natural_log_of_n_over_df() {
        let idx = index_of(vec![doc("a", &["red", "shoe"]), doc("b", &["blue", "shoe"]), doc("c", &["red"])]);
        let s = TfIdfScorer::new(&idx);
        assert!((s.idf("red") - (3.0f32 / 2.0).ln()).abs() < 1e-6);
        assert!((s.idf("blue") - 3.0f32.ln()).abs() < 1e-6);
        assert_eq!(s.idf("green"), 0.0);
    }

    #[test]
    fn matching_document_scores_positive() {
        let idx = index_of(vec![doc("a", &["red", "shoe"]), doc("b", &["blue", "shoe"]), doc("c", &["red", "shirt"])]);
        let scored = TfIdfScorer::new(&idx).score(&q(&["red", "shoe"]), &[0]);
        assert_eq!(scored.len(), 1);
        assert!(scored[0].score > 0.0);
        assert!(scored[0].score <= 1.0 + 1e-6);
    }

    #[test]
    fn proportional_term_counts_give_same_cosine() {
        // d2 has every query term twice as often as d1.
        let idx = index_of(vec![
            doc("d1", &["red", "shoe", "shoe"]),
            doc("d2", &["red", "red", "shoe", "shoe", "shoe", "shoe"]),
            doc("d3", &["red", "shirt"]),
            doc("d4", &["blue"]),
        ]);
        let scored = TfIdfScorer::new(&idx).score(&q(&["red", "shoe"]), &[0, 1]);
        assert!((scored[0].score - scored[1].score).abs() < 1e-6);
    }

    #[test]
    fn term_present_everywhere_yields_zero_not_nan() {
        let idx = index_of(vec![doc("a", &["shoe"]), doc("b", &["shoe"])]);
        let scored = TfIdfScorer::new(&idx).score(&q(&["shoe"]), &[0, 1]);
        assert!(scored.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn better_term_balance_ranks_higher() {
        let idx = index_of(vec![
            doc("a", &["red", "shoe"]),
            doc("b", &["red", "red", "red", "shoe"]),
            doc("c", &["blue"]),
            doc("d", &["green"]),
        ]);
        let scored = TfIdfScorer::new(&idx).score(&q(&["red", "shoe"]), &[0, 1]);
        assert!(scored[0].score > scored[1].score);
    }
}
