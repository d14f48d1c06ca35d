use super::{ScoredDoc, Scorer, TfIdfScorer};
use crate::config::{ScoringConfig, NEUTRAL_NORM};
use crate::document::{DocId, DocumentStore, NumericAttributes};

/// Textual relevance blended with catalog signals.
///
/// score = w_text * tfidf_norm + w_rating * rating_norm + w_discount * discount_norm
///       + w_price * (1 - price_norm) - stock_penalty
///
/// Every `_norm` is min-max over the current candidate set. A missing numeric
/// attribute takes the candidate-set mean of that attribute.
pub struct HybridScorer<'a> {
    text: TfIdfScorer<'a>,
    store: &'a DocumentStore,
    config: ScoringConfig,
}

impl<'a> HybridScorer<'a> {
    pub fn new(text: TfIdfScorer<'a>, store: &'a DocumentStore, config: ScoringConfig) -> Self {
        Self { text, store, config }
    }

    fn attribute(&self, candidates: &[DocId], get: impl Fn(&NumericAttributes) -> Option<f32>) -> Vec<f32> {
        let raw: Vec<Option<f32>> = candidates
            .iter()
            .map(|&id| self.store.get(id).and_then(|d| get(&d.numeric)))
            .collect();
        min_max(&fill_missing(&raw))
    }
}

impl Scorer for HybridScorer<'_> {
    fn score(&self, query: &[String], candidates: &[DocId]) -> Vec<ScoredDoc> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let text_raw: Vec<f32> = self.text.score(query, candidates).iter().map(|s| s.score).collect();
        let text = min_max(&text_raw);
        let rating = self.attribute(candidates, |n| n.average_rating);
        let discount = self.attribute(candidates, |n| n.discount);
        let price = self.attribute(candidates, |n| n.selling_price);

        let w = self.config.hybrid;
        candidates
            .iter()
            .enumerate()
            .map(|(i, &doc_id)| {
                let out_of_stock = self.store.get(doc_id).is_some_and(|d| d.numeric.is_out_of_stock());
                let penalty = if out_of_stock { self.config.stock_penalty } else { 0.0 };
                let score = w.text * text[i] + w.rating * rating[i] + w.discount * discount[i]
                    + w.price * (1.0 - price[i])
                    - penalty;
                ScoredDoc { doc_id, score }
            })
            .collect()
    }
}

/// Replace missing values with the mean of the present ones. When nothing is
/// present every slot gets the same value, which `min_max` maps to neutral.
fn fill_missing(values: &[Option<f32>]) -> Vec<f32> {
    let present: Vec<f32> = values.iter().flatten().copied().collect();
    let mean = if present.is_empty() {
        0.0
    } else {
        present.iter().sum::<f32>() / present.len() as f32
    };
    if present.len() < values.len() {
        tracing::debug!(missing = values.len() - present.len(), mean, "filling missing numeric attribute");
    }
    values.iter().map(|v| v.unwrap_or(mean)).collect()
}

/// Min-max to [0, 1]; a zero range maps everything to [`NEUTRAL_NORM`].
fn min_max(values: &[f32]) -> Vec<f32> {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if range.is_nan() || range <= f32::EPSILON {
        return vec![NEUTRAL_NORM; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{doc, Document};
    use crate::index::{IndexOptions, InvertedIndex};
    use crate::scoring::rank;

    fn with_numeric(mut d: Document, rating: Option<f32>, discount: Option<f32>, price: Option<f32>, oos: bool) -> Document {
        d.numeric = NumericAttributes {
            average_rating: rating,
            discount,
            selling_price: price,
            actual_price: None,
            out_of_stock: Some(oos),
        };
        d
    }

    fn run(docs: Vec<Document>, query: &[&str], config: ScoringConfig) -> Vec<ScoredDoc> {
        let store = DocumentStore::from_documents(docs).unwrap();
        let idx = InvertedIndex::build(&store, &IndexOptions::default());
        let query: Vec<String> = query.iter().map(|s| s.to_string()).collect();
        let candidates: Vec<DocId> = (0..store.len() as DocId).collect();
        let scorer = HybridScorer::new(TfIdfScorer::new(&idx), &store, config);
        rank(scorer.score(&query, &candidates), 10)
    }

    #[test]
    fn min_max_and_neutral() {
        assert_eq!(min_max(&[1.0, 3.0, 2.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(min_max(&[4.0, 4.0]), vec![NEUTRAL_NORM, NEUTRAL_NORM]);
        assert!(min_max(&[]).is_empty());
    }

    #[test]
    fn missing_values_take_the_mean() {
        assert_eq!(fill_missing(&[Some(2.0), None, Some(4.0)]), vec![2.0, 3.0, 4.0]);
        assert_eq!(fill_missing(&[None, None]), vec![0.0, 0.0]);
    }

    #[test]
    fn higher_rating_wins_on_equal_text() {
        let docs = vec![
            with_numeric(doc("low", &["red", "shoe"]), Some(2.0), Some(10.0), Some(500.0), false),
            with_numeric(doc("high", &["red", "shoe"]), Some(4.5), Some(10.0), Some(500.0), false),
            doc("other", &["blue"]),
        ];
        let ranked = run(docs, &["red", "shoe"], ScoringConfig::default());
        // "other" is in the candidate list too but has no textual match.
        let first_two: Vec<DocId> = ranked.iter().filter(|s| s.doc_id != 2).map(|s| s.doc_id).collect();
        assert_eq!(first_two, vec![1, 0]);
    }

    #[test]
    fn stock_penalty_is_subtracted() {
        let docs = vec![
            with_numeric(doc("a", &["shoe"]), Some(4.0), Some(20.0), Some(100.0), true),
            with_numeric(doc("b", &["shoe"]), Some(4.0), Some(20.0), Some(100.0), false),
        ];
        let config = ScoringConfig { stock_penalty: 0.3, ..Default::default() };
        let ranked = run(docs, &["shoe"], config);
        assert_eq!(ranked[0].doc_id, 1);
        assert!((ranked[0].score - ranked[1].score - 0.3).abs() < 1e-6);
    }

    #[test]
    fn cheaper_product_preferred() {
        let docs = vec![
            with_numeric(doc("a", &["shoe"]), Some(4.0), Some(20.0), Some(900.0), false),
            with_numeric(doc("b", &["shoe"]), Some(4.0), Some(20.0), Some(300.0), false),
        ];
        let ranked = run(docs, &["shoe"], ScoringConfig::default());
        assert_eq!(ranked[0].doc_id, 1);
    }

    #[test]
    fn missing_numerics_never_fail() {
        let docs = vec![
            with_numeric(doc("a", &["shoe"]), None, None, None, false),
            with_numeric(doc("b", &["shoe"]), Some(3.0), None, Some(200.0), false),
        ];
        let ranked = run(docs, &["shoe"], ScoringConfig::default());
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|s| s.score.is_finite()));
    }
}
