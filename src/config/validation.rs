//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts, retry budget, expiration horizon)
//! - Check node URLs and the chain id override
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: HiveConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::blockchain::types::MAX_EXPIRATION_SECS;
use crate::config::schema::HiveConfig;
use crate::node_pool::normalize_url;

/// A single semantic problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every section of `config`.
pub fn validate_config(config: &HiveConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.nodes.urls.is_empty() {
        errors.push(ValidationError::new("nodes.urls", "at least one node is required"));
    }
    for (i, url) in config.nodes.urls.iter().enumerate() {
        if let Err(e) = normalize_url(url) {
            errors.push(ValidationError::new(format!("nodes.urls[{}]", i), e));
        }
    }
    if config.nodes.max_failures == 0 {
        errors.push(ValidationError::new("nodes.max_failures", "must be at least 1"));
    }

    if !(1..=120).contains(&config.rpc.timeout_secs) {
        errors.push(ValidationError::new("rpc.timeout_secs", "must be within 1..=120"));
    }
    if !(1..=10).contains(&config.rpc.retries) {
        errors.push(ValidationError::new("rpc.retries", "must be within 1..=10"));
    }
    if config.rpc.base_delay_ms > config.rpc.max_delay_ms {
        errors.push(ValidationError::new(
            "rpc.base_delay_ms",
            "must not exceed rpc.max_delay_ms",
        ));
    }

    if let Err(e) = config.chain.resolve_chain_id() {
        errors.push(ValidationError::new("chain.chain_id", e.to_string()));
    }

    let expiration = config.transactions.expiration_secs;
    if expiration == 0 || expiration > MAX_EXPIRATION_SECS {
        errors.push(ValidationError::new(
            "transactions.expiration_secs",
            format!("must be within 1..={}", MAX_EXPIRATION_SECS),
        ));
    }

    if config.observability.log_level.trim().is_empty() {
        errors.push(ValidationError::new("observability.log_level", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&HiveConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = HiveConfig::default();
        config.nodes.urls = vec!["api.hive.blog".into(), "".into()];
        config.rpc.timeout_secs = 0;
        config.rpc.retries = 11;
        config.transactions.expiration_secs = 7200;
        config.chain.chain_id = Some("nothex".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "nodes.urls[1]",
                "rpc.timeout_secs",
                "rpc.retries",
                "chain.chain_id",
                "transactions.expiration_secs",
            ]
        );
    }

    #[test]
    fn test_empty_node_list() {
        let mut config = HiveConfig::default();
        config.nodes.urls.clear();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].to_string(), "nodes.urls: at least one node is required");
    }
}
