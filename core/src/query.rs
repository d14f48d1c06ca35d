//! Conjunctive (AND) candidate generation.

use crate::document::DocId;
use crate::index::{InvertedIndex, TermEntry};

/// Documents containing every query term.
///
/// Any term missing from the index empties the result. Postings are
/// intersected rarest-first so the running set only shrinks. The returned ids
/// happen to be ascending; callers must not rely on any order.
pub fn conjunctive_candidates<S: AsRef<str>>(index: &InvertedIndex, terms: &[S]) -> Vec<DocId> {
    if terms.is_empty() {
        return Vec::new();
    }

    let mut entries: Vec<&TermEntry> = Vec::with_capacity(terms.len());
    for term in terms {
        let term: &str = term.as_ref();
        match index.entry(term) {
            Some(entry) => entries.push(entry),
            None => {
                tracing::debug!(term, "query term not in index");
                return Vec::new();
            }
        }
    }
    // Address as tiebreak keeps repeated terms adjacent for dedup.
    entries.sort_by_key(|e| (e.df, *e as *const TermEntry as usize));
    entries.dedup_by(|a, b| std::ptr::eq(*a, *b));

    let mut acc: Vec<DocId> = entries[0].postings.iter().map(|p| p.doc_id).collect();
    for entry in &entries[1..] {
        if acc.is_empty() {
            break;
        }
        acc = intersect_sorted(&acc, entry);
    }
    acc
}

/// Linear merge of an ascending id list with a term's ascending postings.
fn intersect_sorted(ids: &[DocId], entry: &TermEntry) -> Vec<DocId> {
    let postings = &entry.postings;
    let mut out = Vec::with_capacity(ids.len().min(postings.len()));
    let (mut i, mut j) = (0usize, 0usize);
    while i < ids.len() && j < postings.len() {
        let (x, y) = (ids[i], postings[j].doc_id);
        if x == y {
            out.push(x);
            i += 1;
            j += 1;
        } else if x < y {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{doc, DocumentStore};
    use crate::index::IndexOptions;
    use std::collections::BTreeSet;

    fn index() -> InvertedIndex {
        let store = DocumentStore::from_documents(vec![
            doc("d1", &["red", "shoe"]),
            doc("d2", &["blue", "shoe"]),
            doc("d3", &["red", "shirt"]),
            doc("d4", &["red", "blue", "shoe", "shirt"]),
        ])
        .unwrap();
        InvertedIndex::build(&store, &IndexOptions::default())
    }

    fn ids_of(idx: &InvertedIndex, term: &str) -> BTreeSet<DocId> {
        idx.entry(term).unwrap().postings.iter().map(|p| p.doc_id).collect()
    }

    #[test]
    fn and_of_two_terms_is_set_intersection() {
        let idx = index();
        let expected: BTreeSet<DocId> = ids_of(&idx, "red").intersection(&ids_of(&idx, "shoe")).copied().collect();
        let ab: BTreeSet<DocId> = conjunctive_candidates(&idx, &["red", "shoe"]).into_iter().collect();
        let ba: BTreeSet<DocId> = conjunctive_candidates(&idx, &["shoe", "red"]).into_iter().collect();
        assert_eq!(ab, expected);
        assert_eq!(ba, expected);
        assert_eq!(ab, BTreeSet::from([0, 3]));
    }

    #[test]
    fn unknown_term_short_circuits() {
        let idx = index();
        assert!(conjunctive_candidates(&idx, &["red", "purple"]).is_empty());
    }

    #[test]
    fn empty_query_has_no_candidates() {
        let idx = index();
        let none: [&str; 0] = [];
        assert!(conjunctive_candidates(&idx, &none).is_empty());
    }

    #[test]
    fn repeated_terms_do_not_change_the_set() {
        let idx = index();
        assert_eq!(
            conjunctive_candidates(&idx, &["red", "red", "shoe"]),
            conjunctive_candidates(&idx, &["red", "shoe"])
        );
    }

    #[test]
    fn three_way_intersection() {
        let idx = index();
        assert_eq!(conjunctive_candidates(&idx, &["blue", "shirt", "red"]), vec![3]);
        assert_eq!(conjunctive_candidates(&idx, &["shoe"]), vec![0, 1, 3]);
    }
}
