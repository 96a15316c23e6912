//! Configuration schema definitions.
//!
//! # Example `glossa.toml`
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [knowledge]
//! source = "file"
//! path = "glossary.toml"
//!
//! [matcher]
//! max_results = 5
//!
//! [reply]
//! max_message_len = 4096
//!
//! [router]
//! command_prefix = "/"
//!
//! [adapters.telegram]
//! bot_token = "123456:ABC..."
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use figment::value::Value;
use glossa_core::{DEFAULT_MAX_MESSAGE_LEN, DEFAULT_MAX_RESULTS, RouterConfig};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GlossaConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where the knowledge base is loaded from.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Matcher settings.
    #[serde(default)]
    pub matcher: MatcherConfig,

    /// Reply delivery settings.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Command syntax and user-facing texts.
    #[serde(default)]
    pub router: RouterConfig,

    /// Event loop settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Raw per-adapter sections, keyed by adapter name.
    #[serde(default)]
    pub adapters: HashMap<String, Value>,
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the filter-directive spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to compact otherwise.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Rotation policy for file output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level. `RUST_LOG` takes precedence when set.
    pub level: LogLevel,

    /// Output format.
    pub format: LogFormat,

    /// Output destination.
    pub output: LogOutput,

    /// Log file path, required when `output = "file"`.
    pub file_path: Option<PathBuf>,

    /// File rotation policy.
    pub rotation: LogRotation,

    /// Per-module level overrides, e.g. `glossa_core = "debug"`.
    pub filters: HashMap<String, LogLevel>,

    /// Include thread IDs.
    pub thread_ids: bool,

    /// Include source file and line.
    pub file_location: bool,

    /// Span lifecycle events.
    pub span_events: SpanEventConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            rotation: LogRotation::Never,
            filters: HashMap::new(),
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
        }
    }
}

// =============================================================================
// Knowledge
// =============================================================================

/// Knowledge base source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum KnowledgeConfig {
    /// A TOML, JSON or YAML glossary file with an ordered `entries` list.
    File {
        /// Path to the glossary file.
        path: PathBuf,
    },

    /// A SQLite database with `term` and `definition` columns.
    Sqlite {
        /// Path to the database file.
        path: PathBuf,
        /// Table holding the glossary.
        #[serde(default = "default_table")]
        table: String,
    },
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self::File {
            path: PathBuf::from("glossary.toml"),
        }
    }
}

impl KnowledgeConfig {
    /// Returns the source path.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::File { path } | Self::Sqlite { path, .. } => path,
        }
    }

    /// Returns the source kind for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::File { .. } => "file",
            Self::Sqlite { .. } => "sqlite",
        }
    }
}

fn default_table() -> String {
    "glossary".to_string()
}

// =============================================================================
// Pipeline
// =============================================================================

/// Matcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Maximum number of definitions per reply batch.
    pub max_results: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// Reply delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Maximum characters per outbound message.
    pub max_message_len: usize,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

/// Event loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Capacity of each adapter's inbound event channel.
    pub event_buffer: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { event_buffer: 256 }
    }
}
