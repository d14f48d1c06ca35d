//! Word-vector lookup consumed by the embedding scorer.
//!
//! Vectors come from an external provider (trained on the catalog or
//! pretrained). The core only reads them; entries whose dimension disagrees
//! with the lookup's are excluded.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::BufRead;

pub trait EmbeddingLookup: Send + Sync {
    /// Dimension shared by every vector this lookup returns.
    fn dim(&self) -> usize;

    fn vector(&self, term: &str) -> Option<&[f32]>;
}

/// In-memory term → vector table with a fixed dimension.
#[derive(Debug, Clone, Default)]
pub struct WordVectors {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl WordVectors {
    pub fn new(dim: usize) -> Self {
        Self { dim, vectors: HashMap::new() }
    }

    /// Returns false (and stores nothing) when the dimension does not match.
    pub fn insert(&mut self, term: impl Into<String>, vector: Vec<f32>) -> bool {
        let term = term.into();
        if vector.len() != self.dim {
            tracing::warn!(term = %term, expected = self.dim, got = vector.len(), "skipping word vector with wrong dimension");
            return false;
        }
        self.vectors.insert(term, vector);
        true
    }

    /// Dimension is taken from the first entry.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut iter = entries.into_iter().peekable();
        let dim = iter.peek().map_or(0, |(_, v)| v.len());
        let mut out = Self::new(dim);
        for (term, vector) in iter {
            out.insert(term, vector);
        }
        out
    }

    /// Read the word2vec/GloVe text format: one `term v1 v2 ... vd` per line,
    /// with an optional leading `count dim` header.
    pub fn read_text<R: BufRead>(reader: R) -> Result<Self> {
        let mut out: Option<WordVectors> = None;
        let mut skipped = 0usize;
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let Some(term) = parts.next() else { continue };
            let values: std::result::Result<Vec<f32>, _> = parts.map(str::parse::<f32>).collect();
            let values = match values {
                Ok(v) => v,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            if lineno == 0 && values.len() == 1 && term.parse::<usize>().is_ok() {
                out = Some(WordVectors::new(values[0] as usize));
                continue;
            }
            if values.is_empty() {
                skipped += 1;
                continue;
            }
            let table = out.get_or_insert_with(|| WordVectors::new(values.len()));
            if !table.insert(term, values) {
                skipped += 1;
            }
        }
        let table = out.filter(|t| !t.is_empty()).ok_or_else(|| Error::InvalidEmbedding("no usable vectors".into()))?;
        tracing::info!(terms = table.len(), dim = table.dim, skipped, "word vectors loaded");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl EmbeddingLookup for WordVectors {
    fn dim(&self) -> usize {
        self.dim
    }

    fn vector(&self, term: &str) -> Option<&[f32]> {
        self.vectors.get(term).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn mismatched_dimension_is_rejected() {
        let mut wv = WordVectors::new(2);
        assert!(wv.insert("red", vec![1.0, 0.0]));
        assert!(!wv.insert("blue", vec![1.0, 0.0, 0.0]));
        assert_eq!(wv.len(), 1);
        assert!(wv.vector("blue").is_none());
        assert_eq!(wv.vector("red"), Some(&[1.0, 0.0][..]));
    }

    #[test]
    fn from_entries_uses_first_dimension() {
        let wv = WordVectors::from_entries(vec![("a", vec![1.0, 2.0]), ("b", vec![3.0]), ("c", vec![0.0, 1.0])]);
        assert_eq!(wv.dim(), 2);
        assert_eq!(wv.len(), 2);
    }

    #[test]
    fn reads_text_format_with_header() {
        let text = "3 2\nred 1.0 0.0\nblue 0.0 1.0\nbad 1.0\n";
        let wv = WordVectors::read_text(Cursor::new(text)).unwrap();
        assert_eq!(wv.dim(), 2);
        assert_eq!(wv.len(), 2);
    }

    #[test]
    fn reads_text_format_without_header() {
        let text = "red 1 0 0\nshoe 0 1 0\nshirt 0 0 x\n";
        let wv = WordVectors::read_text(Cursor::new(text)).unwrap();
        assert_eq!(wv.dim(), 3);
        assert_eq!(wv.len(), 2);
    }

    #[test]
    fn empty_source_is_an_error() {
        let err = WordVectors::read_text(Cursor::new("")).unwrap_err();
        assert!(matches!(err, Error::InvalidEmbedding(_)));
    }
}
