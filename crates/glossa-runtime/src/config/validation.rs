//! Configuration validation utilities.
//!
//! Adapter sections are validated by the adapters themselves when they are
//! built from configuration.

use super::error::{ConfigError, ConfigResult};
use super::schema::{GlossaConfig, KnowledgeConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &GlossaConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_knowledge_config(&config.knowledge)?;

    if config.matcher.max_results == 0 {
        return Err(ConfigError::validation(
            "matcher.max_results must be greater than 0",
        ));
    }

    if config.reply.max_message_len == 0 {
        return Err(ConfigError::validation(
            "reply.max_message_len must be greater than 0",
        ));
    }

    if config.router.command_prefix.is_empty() {
        return Err(ConfigError::missing_field("router.command_prefix"));
    }

    if config.runtime.event_buffer == 0 {
        return Err(ConfigError::validation(
            "runtime.event_buffer must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    for target in logging.filters.keys() {
        if target.is_empty() || target.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {target:?}"
            )));
        }
    }

    Ok(())
}

fn validate_knowledge_config(knowledge: &KnowledgeConfig) -> ConfigResult<()> {
    if knowledge.path().as_os_str().is_empty() {
        return Err(ConfigError::missing_field("knowledge.path"));
    }

    if let KnowledgeConfig::Sqlite { table, .. } = knowledge
        && !is_identifier(table)
    {
        return Err(ConfigError::validation(format!(
            "knowledge.table must be a plain SQL identifier, got {table:?}"
        )));
    }

    Ok(())
}

/// Returns true for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GlossaConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = GlossaConfig::default();
        config.matcher.max_results = 0;
        assert!(validate_config(&config).is_err());

        let mut config = GlossaConfig::default();
        config.reply.max_message_len = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_command_prefix_rejected() {
        let mut config = GlossaConfig::default();
        config.router.command_prefix.clear();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = GlossaConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("glossa.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_sqlite_table_must_be_identifier() {
        let mut config = GlossaConfig::default();
        config.knowledge = KnowledgeConfig::Sqlite {
            path: "terms.db".into(),
            table: "glossary; DROP TABLE x".into(),
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("glossary"));
        assert!(is_identifier("_terms2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2terms"));
        assert!(!is_identifier("terms-v2"));
    }
}
