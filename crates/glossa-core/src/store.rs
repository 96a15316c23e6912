//! Knowledge store: the term → definition mapping the matcher queries.
//!
//! Every store follows the same folding rules, implemented once here:
//! terms are unique after [`fold`], term lookups test whether the folded
//! term *contains* the folded query, and definition scoring counts distinct
//! words contained in the folded definition.
//!
//! Result order is always knowledge-base order (insertion order for
//! [`MemoryStore`]). The matcher relies on that order for tie breaks.

use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StoreError, StoreResult};

/// Case-folds a string for comparison.
pub fn fold(s: &str) -> String {
    s.to_lowercase()
}

/// Counts the distinct non-empty `words` that occur in `folded_definition`.
///
/// `words` must already be folded.
pub fn score_definition<S: AsRef<str>>(folded_definition: &str, words: &[S]) -> u32 {
    let mut seen = HashSet::new();
    words
        .iter()
        .map(AsRef::as_ref)
        .filter(|w| !w.is_empty() && seen.insert(*w))
        .filter(|w| folded_definition.contains(*w))
        .count() as u32
}

/// A term and its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The glossary term, in its original casing.
    pub term: String,
    /// The definition text. May contain lightweight markup.
    pub definition: String,
}

impl Entry {
    /// Creates a new entry.
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

/// A term paired with its keyword score for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredTerm {
    /// The matched term.
    pub term: String,
    /// Number of distinct query words found in the definition (always ≥ 1).
    pub score: u32,
}

/// Read-only access to the knowledge base.
///
/// Stores are shared across concurrently handled events and never mutated
/// after construction.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// All terms, sorted ascending, case-insensitively.
    async fn list_terms(&self) -> StoreResult<Vec<String>>;

    /// Entries whose folded term contains the folded `query`, in store order.
    async fn find_by_term_substring(&self, query: &str) -> StoreResult<Vec<Entry>>;

    /// Terms whose definition contains at least one of `words`, in store order.
    async fn find_by_definition_keywords(&self, words: &[String])
    -> StoreResult<Vec<ScoredTerm>>;

    /// Exact, case-insensitive definition lookup.
    async fn definition(&self, term: &str) -> StoreResult<Option<String>>;

    /// Number of entries.
    async fn len(&self) -> StoreResult<usize>;
}

/// Sorts terms the way [`KnowledgeStore::list_terms`] promises.
pub fn sort_terms(terms: &mut [String]) {
    terms.sort_by_cached_key(|t| fold(t));
}

#[derive(Debug, Clone)]
struct IndexedEntry {
    entry: Entry,
    folded_term: String,
    folded_definition: String,
}

/// An immutable, ordered, in-memory knowledge base.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<IndexedEntry>,
    by_term: HashMap<String, usize>,
}

impl MemoryStore {
    /// Builds a store from entries, keeping the first of any folded duplicates.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut store = Self::default();
        for entry in entries {
            let folded_term = fold(&entry.term);
            if store.by_term.contains_key(&folded_term) {
                warn!(term = %entry.term, "Duplicate term ignored");
                continue;
            }
            store.by_term.insert(folded_term.clone(), store.entries.len());
            store.entries.push(IndexedEntry {
                folded_definition: fold(&entry.definition),
                folded_term,
                entry,
            });
        }
        store
    }

    /// Like [`MemoryStore::new`] but fails on an empty knowledge base.
    pub fn non_empty<I>(entries: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = Entry>,
    {
        let store = Self::new(entries);
        if store.entries.is_empty() {
            return Err(StoreError::Empty);
        }
        Ok(store)
    }

    /// Returns the number of entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Iterates entries in store order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().map(|e| &e.entry)
    }
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
    async fn list_terms(&self) -> StoreResult<Vec<String>> {
        let mut terms: Vec<String> = self.entries.iter().map(|e| e.entry.term.clone()).collect();
        sort_terms(&mut terms);
        Ok(terms)
    }

    async fn find_by_term_substring(&self, query: &str) -> StoreResult<Vec<Entry>> {
        let query = fold(query);
        Ok(self
            .entries
            .iter()
            .filter(|e| e.folded_term.contains(&query))
            .map(|e| e.entry.clone())
            .collect())
    }

    async fn find_by_definition_keywords(
        &self,
        words: &[String],
    ) -> StoreResult<Vec<ScoredTerm>> {
        let words: Vec<String> = words.iter().map(|w| fold(w)).collect();
        Ok(self
            .entries
            .iter()
            .filter_map(|e| {
                let score = score_definition(&e.folded_definition, &words);
                (score > 0).then(|| ScoredTerm {
                    term: e.entry.term.clone(),
                    score,
                })
            })
            .collect())
    }

    async fn definition(&self, term: &str) -> StoreResult<Option<String>> {
        Ok(self
            .by_term
            .get(&fold(term))
            .map(|&i| self.entries[i].entry.definition.clone()))
    }

    async fn len(&self) -> StoreResult<usize> {
        Ok(self.entries.len())
    }
}
