//! Positional inverted index over the document store.
//!
//! One merged index: every posting carries field-tagged positions, so term
//! frequency can be taken over all indexed fields or per field.

use crate::document::{DocId, Document, DocumentStore, Field};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Offset of a token within one field's token sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldPosition {
    pub field: Field,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    /// Sorted by (field, offset).
    pub positions: Vec<FieldPosition>,
}

impl Posting {
    pub fn tf(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn tf_in(&self, field: Field) -> u32 {
        self.positions.iter().filter(|p| p.field == field).count() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEntry {
    /// Equals `postings.len()`.
    pub df: u32,
    /// Sorted by ascending doc id, one posting per document.
    pub postings: Vec<Posting>,
}

impl TermEntry {
    pub fn posting(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|i| &self.postings[i])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Field channels that contribute postings and document length.
    pub fields: Vec<Field>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self { fields: Field::ALL.to_vec() }
    }
}

/// Immutable after build; share it by reference across queries.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    terms: HashMap<String, TermEntry>,
    /// Token count over the indexed fields, by doc id.
    doc_lengths: Vec<u32>,
    num_docs: u32,
    avg_doc_len: f32,
    fields: Vec<Field>,
}

impl InvertedIndex {
    pub fn build(store: &DocumentStore, options: &IndexOptions) -> Self {
        let mut acc = PartialIndex::default();
        for (doc_id, doc) in store.iter() {
            acc.add(doc_id, doc, &options.fields);
        }
        Self::finish(acc, store.len(), options)
    }

    /// Partition documents across `workers` scoped threads and merge the
    /// partial indexes. Produces the same index as [`InvertedIndex::build`].
    pub fn build_parallel(store: &DocumentStore, options: &IndexOptions, workers: usize) -> Self {
        let workers = workers.max(1);
        if workers == 1 || store.len() < 2 * workers {
            return Self::build(store, options);
        }
        let chunk = store.len().div_ceil(workers);
        let fields = &options.fields;
        let parts: Vec<PartialIndex> = std::thread::scope(|s| {
            let handles: Vec<_> = store
                .chunks(chunk)
                .map(|(start, docs)| {
                    s.spawn(move || {
                        let mut acc = PartialIndex::default();
                        for (i, doc) in docs.iter().enumerate() {
                            acc.add(start + i as DocId, doc, fields);
                        }
                        acc
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        });
        let merged = parts.into_iter().fold(PartialIndex::default(), PartialIndex::merge);
        Self::finish(merged, store.len(), options)
    }

    fn finish(acc: PartialIndex, num_docs: usize, options: &IndexOptions) -> Self {
        let mut doc_lengths = vec![0u32; num_docs];
        for (doc_id, len) in acc.doc_lengths {
            doc_lengths[doc_id as usize] = len;
        }
        let total: u64 = doc_lengths.iter().map(|&l| l as u64).sum();
        let avg_doc_len = if num_docs == 0 { 0.0 } else { total as f32 / num_docs as f32 };

        let terms: HashMap<String, TermEntry> = acc
            .postings
            .into_iter()
            .map(|(term, mut postings)| {
                postings.sort_by_key(|p| p.doc_id);
                (term, TermEntry { df: postings.len() as u32, postings })
            })
            .collect();

        tracing::info!(num_docs, num_terms = terms.len(), avg_doc_len, "inverted index built");
        Self {
            terms,
            doc_lengths,
            num_docs: num_docs as u32,
            avg_doc_len,
            fields: options.fields.clone(),
        }
    }

    pub fn entry(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }

    pub fn df(&self, term: &str) -> u32 {
        self.terms.get(term).map_or(0, |e| e.df)
    }

    pub fn tf(&self, term: &str, doc_id: DocId) -> u32 {
        self.entry(term).and_then(|e| e.posting(doc_id)).map_or(0, Posting::tf)
    }

    pub fn doc_len(&self, doc_id: DocId) -> u32 {
        self.doc_lengths.get(doc_id as usize).copied().unwrap_or(0)
    }

    pub fn avg_doc_len(&self) -> f32 {
        self.avg_doc_len
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermEntry)> {
        self.terms.iter().map(|(t, e)| (t.as_str(), e))
    }
}

/// Build-time accumulator for a disjoint range of documents.
#[derive(Default)]
struct PartialIndex {
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: Vec<(DocId, u32)>,
}

impl PartialIndex {
    fn add(&mut self, doc_id: DocId, doc: &Document, fields: &[Field]) {
        let mut per_term: HashMap<&str, Vec<FieldPosition>> = HashMap::new();
        let mut len = 0u32;
        for &field in fields {
            for (offset, token) in doc.tokens.get(field).iter().enumerate() {
                per_term
                    .entry(token.as_str())
                    .or_default()
                    .push(FieldPosition { field, offset: offset as u32 });
                len += 1;
            }
        }
        self.doc_lengths.push((doc_id, len));
        for (term, mut positions) in per_term {
            positions.sort();
            self.postings
                .entry(term.to_string())
                .or_default()
                .push(Posting { doc_id, positions });
        }
    }

    /// Document ranges are disjoint, so merging is concatenation; the final
    /// sort in `finish` restores doc id order regardless of merge order.
    fn merge(mut self, other: PartialIndex) -> PartialIndex {
        for (term, postings) in other.postings {
            self.postings.entry(term).or_default().extend(postings);
        }
        self.doc_lengths.extend(other.doc_lengths);
        self
    }
}
