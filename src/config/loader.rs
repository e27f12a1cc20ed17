//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::HiveConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<HiveConfig, ConfigError> {
    let config: HiveConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HiveConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    tracing::debug!(
        path = %path.display(),
        nodes = config.nodes.urls.len(),
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config("[rpc]\nretries = 5\n").unwrap();
        assert_eq!(config.rpc.retries, 5);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_config("[rpc\nretries = 5"),
            Err(ConfigError::Parse(_))
        ));

        let err = parse_config("[rpc]\nretries = 0\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: rpc.retries: must be within 1..=10"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/hive-client.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
