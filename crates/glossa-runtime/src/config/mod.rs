//! Configuration module for the Glossa runtime.
//!
//! Loads layered configuration with figment and validates it before the
//! runtime is assembled.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, Profile, load_config, load_config_from_file};
pub use schema::{
    GlossaConfig, KnowledgeConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    MatcherConfig, ReplyConfig, RuntimeConfig, SpanEventConfig,
};
pub use validation::{is_identifier, validate_config};
