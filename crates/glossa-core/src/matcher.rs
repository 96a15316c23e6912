//! The two-phase match cascade.
//!
//! # Phases
//!
//! 1. **Term match**: the whole normalized message is looked up as a
//!    substring of every term. Any hit ends the search; results keep store
//!    order and are truncated to `max_results`.
//! 2. **Keyword match**: only reached when phase 1 found nothing. The message
//!    is reduced to word tokens, each definition is scored by how many
//!    distinct tokens it contains, and the best `max_results` are returned.
//!
//! ```text
//! "incidence" ──▶ phase 1 hit ──────────────────────────▶ Definitions
//! "cases"     ──▶ phase 1 miss ─▶ tokens ─▶ scored ─────▶ Definitions
//! "???"       ──▶ phase 1 miss ─▶ no tokens ────────────▶ NoKeywords
//! "xyz123"    ──▶ phase 1 miss ─▶ tokens ─▶ all zero ───▶ NoInformation
//! ```
//!
//! Phase 2 ties keep store order. There is no secondary ranking key.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::StoreResult;
use crate::store::{KnowledgeStore, fold};

/// Default number of definitions returned per query.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Result of matching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The message was empty after trimming. Nothing should be sent.
    Empty,
    /// Ranked definitions, best first. Never empty.
    Definitions(Vec<String>),
    /// Phase 2 was reached but the message held no word tokens.
    NoKeywords,
    /// Phase 2 tokens matched no definition.
    NoInformation,
}

/// Trims and case-folds raw message text.
pub fn normalize(text: &str) -> String {
    fold(text.trim())
}

/// Splits text into distinct word tokens.
///
/// Characters that are neither word characters (alphanumeric or `_`) nor
/// whitespace are removed first, so `"what's"` becomes `"whats"`. Duplicate
/// tokens are dropped, keeping first-seen order.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|t| seen.insert(*t))
        .map(str::to_owned)
        .collect()
}

/// Matches free text against a knowledge store.
#[derive(Clone)]
pub struct Matcher {
    store: Arc<dyn KnowledgeStore>,
    max_results: usize,
}

impl Matcher {
    /// Creates a matcher returning up to [`DEFAULT_MAX_RESULTS`] definitions.
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self {
            store,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Sets the maximum number of definitions per query.
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max.max(1);
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.store
    }

    /// Runs the match cascade for `text`.
    pub async fn find(&self, text: &str) -> StoreResult<MatchOutcome> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Ok(MatchOutcome::Empty);
        }

        let hits = self.store.find_by_term_substring(&normalized).await?;
        if !hits.is_empty() {
            debug!(query = %normalized, hits = hits.len(), "Term match");
            return Ok(MatchOutcome::Definitions(
                hits.into_iter()
                    .take(self.max_results)
                    .map(|e| e.definition)
                    .collect(),
            ));
        }

        let tokens = tokenize(&normalized);
        if tokens.is_empty() {
            trace!(query = %normalized, "No keywords left after tokenizing");
            return Ok(MatchOutcome::NoKeywords);
        }

        let mut scored = self.store.find_by_definition_keywords(&tokens).await?;
        // Stable: equal scores keep store order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(self.max_results);

        let mut definitions = Vec::with_capacity(scored.len());
        for candidate in scored {
            if let Some(definition) = self.store.definition(&candidate.term).await? {
                definitions.push(definition);
            }
        }

        debug!(
            query = %normalized,
            tokens = tokens.len(),
            hits = definitions.len(),
            "Keyword match"
        );

        if definitions.is_empty() {
            Ok(MatchOutcome::NoInformation)
        } else {
            Ok(MatchOutcome::Definitions(definitions))
        }
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("max_results", &self.max_results)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Entry, MemoryStore};

    fn matcher(entries: Vec<Entry>) -> Matcher {
        Matcher::new(Arc::new(MemoryStore::new(entries)))
    }

    fn epi() -> Matcher {
        matcher(vec![
            Entry::new("Incidence", "Incidence is the rate of new cases..."),
            Entry::new("Prevalence", "Prevalence measures existing cases..."),
        ])
    }

    fn defs(outcome: MatchOutcome) -> Vec<String> {
        match outcome {
            MatchOutcome::Definitions(d) => d,
            other => panic!("expected definitions, got {other:?}"),
        }
    }

    #[test]
    fn test_tokenize_strips_punctuation() {
        assert_eq!(tokenize("what's  the rate?!"), vec!["whats", "the", "rate"]);
        assert!(tokenize("?? !! ...").is_empty());
    }

    #[test]
    fn test_tokenize_dedupes() {
        assert_eq!(tokenize("rate rate cases"), vec!["rate", "cases"]);
    }

    #[test]
    fn test_tokenize_keeps_unicode_words() {
        assert_eq!(tokenize("заболеваемость, snake_case"), vec!["заболеваемость", "snake_case"]);
    }

    #[tokio::test]
    async fn test_empty_message() {
        assert_eq!(epi().find("   \n ").await.unwrap(), MatchOutcome::Empty);
    }

    #[tokio::test]
    async fn test_phase_one_term_match() {
        let out = epi().find("  INCIDENCE ").await.unwrap();
        assert_eq!(defs(out), vec!["Incidence is the rate of new cases..."]);
    }

    #[tokio::test]
    async fn test_phase_two_keyword_match_keeps_store_order_on_ties() {
        let out = epi().find("cases").await.unwrap();
        assert_eq!(
            defs(out),
            vec![
                "Incidence is the rate of new cases...",
                "Prevalence measures existing cases...",
            ]
        );
    }

    #[tokio::test]
    async fn test_punctuation_only_asks_for_keywords() {
        assert_eq!(epi().find("???").await.unwrap(), MatchOutcome::NoKeywords);
    }

    #[tokio::test]
    async fn test_unknown_word_has_no_information() {
        assert_eq!(
            epi().find("xyz123").await.unwrap(),
            MatchOutcome::NoInformation
        );
    }

    #[tokio::test]
    async fn test_phase_one_wins_over_better_keyword_scores() {
        let m = matcher(vec![
            Entry::new("Rate", "short"),
            Entry::new("Other", "rate rate rate of everything"),
        ]);
        assert_eq!(defs(m.find("rate").await.unwrap()), vec!["short"]);
    }

    #[tokio::test]
    async fn test_phase_two_ranks_by_score() {
        let m = matcher(vec![
            Entry::new("A", "one match: alpha"),
            Entry::new("B", "alpha and beta"),
            Entry::new("C", "nothing"),
        ]);
        let out = defs(m.find("alpha beta").await.unwrap());
        assert_eq!(out, vec!["alpha and beta", "one match: alpha"]);
    }

    #[tokio::test]
    async fn test_results_truncated_to_max() {
        let entries = (0..8)
            .map(|i| Entry::new(format!("term {i}"), format!("def {i}")))
            .collect();
        let m = matcher(entries);
        assert_eq!(defs(m.find("term").await.unwrap()).len(), 5);

        let m = m.max_results(3);
        assert_eq!(defs(m.find("def").await.unwrap()).len(), 3);
    }

    #[tokio::test]
    async fn test_every_term_finds_itself() {
        let entries: Vec<Entry> = ["Odds ratio", "Odds", "Bias", "Confounding", "Sensitivity"]
            .into_iter()
            .map(|t| Entry::new(t, format!("about {t}")))
            .collect();
        let m = matcher(entries.clone());
        for entry in entries {
            let out = defs(m.find(&fold(&entry.term)).await.unwrap());
            assert!(out.contains(&entry.definition), "{} not found", entry.term);
        }
    }

    #[tokio::test]
    async fn test_repeated_queries_are_identical() {
        let m = epi();
        let first = m.find("new cases").await.unwrap();
        let second = m.find("new cases").await.unwrap();
        assert_eq!(first, second);
    }
}
