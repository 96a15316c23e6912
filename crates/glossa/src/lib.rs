//! # Glossa
//!
//! A glossary lookup chat bot. Users send a term or a few keywords; Glossa
//! answers with the matching definitions from its knowledge base, split to
//! fit the platform's message-size limit.
//!
//! ## Crates
//!
//! - [`core`]: knowledge store, matcher, reply dispatcher and router
//! - [`runtime`]: configuration, logging, knowledge loading, adapter orchestration
//! - [`telegram`]: Telegram Bot API adapter
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use glossa::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = GlossaRuntime::builder().config_file("glossa.toml").build().await?;
//!     runtime.register_adapter::<TelegramAdapter>().await?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration and glossary files
//! - `yaml-config`: YAML configuration and glossary files
//! - `json-log`: JSON log output
//! - `sqlite`: SQLite knowledge source

pub use glossa_adapter_telegram as telegram;
pub use glossa_core as core;
pub use glossa_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use glossa_adapter_telegram::{TelegramAdapter, TelegramConfig};
    pub use glossa_core::prelude::*;
    pub use glossa_core::{MatchOutcome, RouteOutcome, RouterConfig};
    pub use glossa_runtime::config::{ConfigLoader, GlossaConfig};
    pub use glossa_runtime::{GlossaRuntime, RuntimeError, RuntimeResult};
}
