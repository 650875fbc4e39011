use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StepwiseError};
use crate::types::{InsertPosition, LogicOperator};

/// Top-level Stepwise configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Workflow editor behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Operator given to condition groups the editor creates (default: AND).
    #[serde(default)]
    pub default_operator: LogicOperator,
    /// Where a post-function without a declared weight is inserted.
    #[serde(default)]
    pub new_function_position: InsertPosition,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_operator: LogicOperator::And,
            new_function_position: InsertPosition::Head,
        }
    }
}

/// Workflow migration policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Number of failed issues after which a project migration is aborted.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
        }
    }
}

fn default_failure_threshold() -> usize { 10 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| StepwiseError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        let config: Self =
            toml::from_str(&expanded).map_err(|e| StepwiseError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.migration.failure_threshold == 0 {
            return Err(StepwiseError::Config(
                "migration.failure_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_STEPWISE_VAR", "hello");
        let result = expand_env_vars("key = \"${TEST_STEPWISE_VAR}\"");
        assert_eq!(result, "key = \"hello\"");
        std::env::remove_var("TEST_STEPWISE_VAR");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let result = expand_env_vars("key = \"${NONEXISTENT_STEPWISE_VAR}\"");
        assert_eq!(result, "key = \"${NONEXISTENT_STEPWISE_VAR}\"");
    }

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.editor.default_operator, LogicOperator::And);
        assert_eq!(config.editor.new_function_position, InsertPosition::Head);
        assert_eq!(config.migration.failure_threshold, 10);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let toml_str = r#"
[editor]
default_operator = "OR"

[migration]
failure_threshold = 3
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.editor.default_operator, LogicOperator::Or);
        assert_eq!(config.editor.new_function_position, InsertPosition::Head);
        assert_eq!(config.migration.failure_threshold, 3);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut config = AppConfig::default();
        config.migration.failure_threshold = 0;
        assert!(matches!(config.validate(), Err(StepwiseError::Config(_))));
    }
}
