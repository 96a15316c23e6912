//! Glossa Runtime - configuration, logging, knowledge loading and adapter
//! orchestration for the Glossa glossary bot.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: TOML configuration and glossary files
//! - `yaml-config`: YAML configuration and glossary files
//! - `json-log`: JSON log output
//! - `sqlite`: SQLite knowledge source
//!
//! ```ignore
//! use glossa_runtime::GlossaRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = GlossaRuntime::builder().build().await?;
//!     runtime.register_adapter::<MyAdapter>().await?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod knowledge;
pub mod logging;
pub mod runtime;

pub use config::{ConfigLoader, GlossaConfig, load_config, load_config_from_file, validate_config};
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::{GlossaRuntime, RuntimeBuilder};
