//! Knowledge base loading.
//!
//! The configured source is opened once at startup. Any failure here is
//! fatal: the bot never serves without a usable knowledge base.

mod file;
#[cfg(feature = "sqlite")]
mod sqlite;

use std::sync::Arc;

use glossa_core::{KnowledgeStore, StoreError, StoreResult};
use tracing::info;

use crate::config::KnowledgeConfig;

pub use file::load_file;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Opens the configured knowledge source.
pub async fn load(config: &KnowledgeConfig) -> StoreResult<Arc<dyn KnowledgeStore>> {
    let store: Arc<dyn KnowledgeStore> = match config {
        KnowledgeConfig::File { path } => Arc::new(load_file(path)?),
        #[cfg(feature = "sqlite")]
        KnowledgeConfig::Sqlite { path, table } => {
            Arc::new(SqliteStore::open(path.clone(), table.clone()).await?)
        }
        #[cfg(not(feature = "sqlite"))]
        KnowledgeConfig::Sqlite { .. } => {
            return Err(StoreError::unavailable(
                "SQLite knowledge source requires the `sqlite` feature",
            ));
        }
    };

    let entries = store.len().await?;
    if entries == 0 {
        return Err(StoreError::Empty);
    }

    info!(
        source = config.kind(),
        path = %config.path().display(),
        entries,
        "Knowledge base loaded"
    );
    Ok(store)
}
