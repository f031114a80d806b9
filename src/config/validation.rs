//! Semantic configuration validation.
//!
//! Serde handles shape; this checks values: endpoint URLs must parse,
//! durations that gate correctness must be non-zero, at least one retry
//! round must run. All errors are collected, not just the first.

use crate::config::schema::EngineConfig;
use std::fmt;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (field, value) in [
        ("providers.primary_url", &config.providers.primary_url),
        ("providers.fallback_url", &config.providers.fallback_url),
    ] {
        if let Err(e) = value.parse::<url::Url>() {
            errors.push(ValidationError {
                field,
                message: format!("invalid URL '{value}': {e}"),
            });
        }
    }

    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError {
            field: "cache.ttl_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.retry.max_rounds == 0 {
        errors.push(ValidationError {
            field: "retry.max_rounds",
            message: "at least one round is required".to_string(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs",
            message: "must be greater than zero".to_string(),
        });
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
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_all_errors_are_collected() {
        let mut config = EngineConfig::default();
        config.providers.primary_url = "not a url".to_string();
        config.cache.ttl_secs = 0;
        config.retry.max_rounds = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"providers.primary_url"));
        assert!(fields.contains(&"cache.ttl_secs"));
        assert!(fields.contains(&"retry.max_rounds"));
    }
}
