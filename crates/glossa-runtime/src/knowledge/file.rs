//! Glossary files.
//!
//! A glossary file holds an ordered `entries` list; list order is the
//! knowledge-base order used for tie breaks.
//!
//! ```toml
//! [[entries]]
//! term = "Incidence"
//! definition = "*Incidence* is the rate of new cases in a population."
//! ```

use std::path::Path;

use figment::Figment;
use glossa_core::{Entry, MemoryStore, StoreError, StoreResult};
use serde::Deserialize;
use tracing::debug;

use crate::config::loader::merge_file;

#[derive(Debug, Deserialize)]
struct GlossaryFile {
    #[serde(default)]
    entries: Vec<Entry>,
}

/// Loads a TOML, JSON or YAML glossary file into a [`MemoryStore`].
///
/// Fails when the file is missing, malformed or has no entries.
pub fn load_file(path: &Path) -> StoreResult<MemoryStore> {
    if !path.is_file() {
        return Err(StoreError::unavailable(format!(
            "glossary file not found: {}",
            path.display()
        )));
    }

    let figment = merge_file(Figment::new(), path)
        .map_err(|e| StoreError::unavailable(e.to_string()))?;
    let file: GlossaryFile = figment.extract().map_err(|e| {
        StoreError::unavailable(format!("invalid glossary file {}: {e}", path.display()))
    })?;

    debug!(path = %path.display(), entries = file.entries.len(), "Parsed glossary file");
    MemoryStore::non_empty(file.entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::KnowledgeStore;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[cfg(feature = "toml-config")]
    #[tokio::test]
    async fn test_toml_keeps_file_order() {
        let file = write_temp(
            ".toml",
            r#"
[[entries]]
term = "Prevalence"
definition = "Proportion of existing cases."

[[entries]]
term = "Incidence"
definition = "Rate of new cases."
"#,
        );

        let store = load_file(file.path()).unwrap();
        let order: Vec<_> = store.entries().map(|e| e.term.as_str()).collect();
        assert_eq!(order, ["Prevalence", "Incidence"]);
        assert_eq!(
            store.definition("incidence").await.unwrap().as_deref(),
            Some("Rate of new cases.")
        );
    }

    #[test]
    fn test_empty_file_rejected() {
        let file = write_temp(".json", r#"{"entries": []}"#);
        assert!(matches!(load_file(file.path()), Err(StoreError::Empty)));
    }

    #[test]
    fn test_malformed_entry_rejected() {
        let file = write_temp(".json", r#"{"entries": [{"term": "Bias"}]}"#);
        assert!(matches!(
            load_file(file.path()),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = write_temp(".csv", "term,definition\n");
        assert!(load_file(file.path()).is_err());
    }
}
