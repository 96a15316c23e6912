//! SQLite knowledge source.
//!
//! The database is opened read-only. The table must have `term` and
//! `definition` text columns; `rowid` order is the knowledge-base order.
//! Folding and scoring happen in Rust so results match [`MemoryStore`]
//! exactly, including non-ASCII case folding.
//!
//! [`MemoryStore`]: glossa_core::MemoryStore

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use glossa_core::{
    Entry, KnowledgeStore, ScoredTerm, StoreError, StoreResult, fold, score_definition,
    sort_terms,
};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::config::is_identifier;

/// A read-only glossary table.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    table: Arc<str>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens `path` read-only and checks that `table` is queryable.
    pub async fn open(path: PathBuf, table: String) -> StoreResult<Self> {
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(
                &path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| {
                StoreError::unavailable(format!("cannot open {}: {e}", path.display()))
            })?;
            Self::from_connection(conn, &table)
        })
        .await
        .map_err(|e| StoreError::unavailable(format!("open task failed: {e}")))?
    }

    /// Wraps an existing connection.
    pub fn from_connection(conn: Connection, table: &str) -> StoreResult<Self> {
        if !is_identifier(table) {
            return Err(StoreError::unavailable(format!(
                "invalid table name {table:?}"
            )));
        }

        conn.prepare(&format!("SELECT term, definition FROM {table} LIMIT 1"))
            .map_err(|e| StoreError::unavailable(format!("table {table} unusable: {e}")))?;

        debug!(table, "Opened SQLite glossary");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: Arc::from(table),
        })
    }

    /// Runs `f` over all entries on the blocking pool.
    ///
    /// Rows whose folded term repeats an earlier row are skipped, so the
    /// first occurrence wins as it does for in-memory stores.
    async fn with_entries<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Vec<Entry>) -> T + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let table = Arc::clone(&self.table);

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT term, definition FROM {table} ORDER BY rowid"
                ))
                .map_err(|e| StoreError::query(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(Entry::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                    ))
                })
                .map_err(|e| StoreError::query(e.to_string()))?;

            let mut seen = HashSet::new();
            let mut entries = Vec::new();
            for row in rows {
                let entry = row.map_err(|e| StoreError::query(e.to_string()))?;
                if seen.insert(fold(&entry.term)) {
                    entries.push(entry);
                }
            }
            Ok(f(entries))
        })
        .await
        .map_err(|e| StoreError::query(format!("query task failed: {e}")))?
    }
}

#[async_trait]
impl KnowledgeStore for SqliteStore {
    async fn list_terms(&self) -> StoreResult<Vec<String>> {
        self.with_entries(|entries| {
            let mut terms: Vec<String> = entries.into_iter().map(|e| e.term).collect();
            sort_terms(&mut terms);
            terms
        })
        .await
    }

    async fn find_by_term_substring(&self, query: &str) -> StoreResult<Vec<Entry>> {
        let query = fold(query);
        self.with_entries(move |entries| {
            entries
                .into_iter()
                .filter(|e| fold(&e.term).contains(&query))
                .collect()
        })
        .await
    }

    async fn find_by_definition_keywords(
        &self,
        words: &[String],
    ) -> StoreResult<Vec<ScoredTerm>> {
        let words: Vec<String> = words.iter().map(|w| fold(w)).collect();
        self.with_entries(move |entries| {
            entries
                .into_iter()
                .filter_map(|e| {
                    let score = score_definition(&fold(&e.definition), &words);
                    (score > 0).then_some(ScoredTerm {
                        term: e.term,
                        score,
                    })
                })
                .collect()
        })
        .await
    }

    async fn definition(&self, term: &str) -> StoreResult<Option<String>> {
        let term = fold(term);
        self.with_entries(move |entries| {
            entries
                .into_iter()
                .find(|e| fold(&e.term) == term)
                .map(|e| e.definition)
        })
        .await
    }

    async fn len(&self) -> StoreResult<usize> {
        self.with_entries(|entries| entries.len()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE glossary (term TEXT NOT NULL, definition TEXT NOT NULL);
             INSERT INTO glossary VALUES ('Prevalence', 'Proportion of existing cases.');
             INSERT INTO glossary VALUES ('Incidence', 'Rate of new cases.');
             INSERT INTO glossary VALUES ('ÉTUDE', 'Étude de cohorte.');
             INSERT INTO glossary VALUES ('incidence', 'duplicate');",
        )
        .unwrap();
        SqliteStore::from_connection(conn, "glossary").unwrap()
    }

    #[tokio::test]
    async fn test_rowid_order_and_duplicates() {
        let store = store();
        assert_eq!(store.len().await.unwrap(), 3);

        let found = store.find_by_term_substring("ENCE").await.unwrap();
        let terms: Vec<_> = found.iter().map(|e| e.term.as_str()).collect();
        assert_eq!(terms, ["Prevalence", "Incidence"]);
        assert_eq!(found[1].definition, "Rate of new cases.");
    }

    #[tokio::test]
    async fn test_unicode_folding() {
        let store = store();
        assert_eq!(
            store.definition("étude").await.unwrap().as_deref(),
            Some("Étude de cohorte.")
        );
    }

    #[tokio::test]
    async fn test_keyword_scores() {
        let store = store();
        let scored = store
            .find_by_definition_keywords(&["cases".into(), "new".into()])
            .await
            .unwrap();
        assert_eq!(
            scored,
            vec![
                ScoredTerm {
                    term: "Prevalence".into(),
                    score: 1
                },
                ScoredTerm {
                    term: "Incidence".into(),
                    score: 2
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_terms_sorted() {
        let store = store();
        assert_eq!(
            store.list_terms().await.unwrap(),
            vec!["Incidence", "Prevalence", "ÉTUDE"]
        );
    }

    #[test]
    fn test_rejects_bad_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(SqliteStore::from_connection(conn, "x; DROP").is_err());

        let conn = Connection::open_in_memory().unwrap();
        assert!(SqliteStore::from_connection(conn, "missing").is_err());
    }
}
