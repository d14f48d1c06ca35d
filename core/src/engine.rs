use crate::config::ScoringConfig;
use crate::document::DocumentStore;
use crate::embedding::EmbeddingLookup;
use crate::error::{Error, Result};
use crate::index::{IndexOptions, InvertedIndex};
use crate::query::conjunctive_candidates;
use crate::scoring::{
    rank, Bm25Scorer, DocumentVectors, EmbeddingScorer, HybridScorer, ScoredDoc, Scorer, ScoringModel, TfIdfScorer,
};
use crate::tokenizer::tokenize;

struct Embeddings {
    lookup: Box<dyn EmbeddingLookup>,
    docs: DocumentVectors,
}

/// Document store, index and optional word vectors for one session.
///
/// Nothing is mutated after construction, so `&SearchEngine` can serve any
/// number of concurrent queries.
pub struct SearchEngine {
    store: DocumentStore,
    index: InvertedIndex,
    embeddings: Option<Embeddings>,
    config: ScoringConfig,
}

impl SearchEngine {
    pub fn new(store: DocumentStore, config: ScoringConfig) -> Self {
        Self::build(store, &IndexOptions::default(), config, 1)
    }

    pub fn build(store: DocumentStore, options: &IndexOptions, config: ScoringConfig, workers: usize) -> Self {
        let index = InvertedIndex::build_parallel(&store, options, workers);
        Self { store, index, embeddings: None, config }
    }

    /// Attach a word-vector lookup and precompute document mean vectors.
    pub fn with_embeddings(mut self, lookup: impl EmbeddingLookup + 'static) -> Self {
        let docs = DocumentVectors::build(&self.store, self.index.fields(), &lookup);
        self.embeddings = Some(Embeddings { lookup: Box::new(lookup), docs });
        self
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn has_embeddings(&self) -> bool {
        self.embeddings.is_some()
    }

    /// Models this engine can serve.
    pub fn models(&self) -> Vec<ScoringModel> {
        ScoringModel::ALL
            .into_iter()
            .filter(|m| *m != ScoringModel::Embedding || self.has_embeddings())
            .collect()
    }

    /// Rank the conjunctive candidates of already-tokenized `terms`.
    ///
    /// An empty query or a term missing from the index yields an empty
    /// ranking. The only error is asking for the embedding model without
    /// word vectors.
    pub fn search(&self, terms: &[String], model: ScoringModel, limit: usize) -> Result<Vec<ScoredDoc>> {
        if model == ScoringModel::Embedding && self.embeddings.is_none() {
            return Err(Error::EmbeddingsUnavailable);
        }
        let candidates = conjunctive_candidates(&self.index, terms);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let tfidf = TfIdfScorer::new(&self.index);
        let scored = match model {
            ScoringModel::TfIdf => tfidf.score(terms, &candidates),
            ScoringModel::Bm25 => Bm25Scorer::new(&self.index, self.config.k1, self.config.b).score(terms, &candidates),
            ScoringModel::Hybrid => HybridScorer::new(tfidf, &self.store, self.config).score(terms, &candidates),
            ScoringModel::Embedding => match &self.embeddings {
                Some(e) => EmbeddingScorer::new(e.lookup.as_ref(), &e.docs).score(terms, &candidates),
                None => return Err(Error::EmbeddingsUnavailable),
            },
        };
        tracing::debug!(%model, candidates = candidates.len(), limit, "query scored");
        Ok(rank(scored, limit))
    }

    /// Tokenize raw query text with the corpus pipeline, then [`Self::search`].
    pub fn search_text(&self, text: &str, model: ScoringModel, limit: usize) -> Result<Vec<ScoredDoc>> {
        self.search(&tokenize(text), model, limit)
    }
}
