use std::io::Write;

use stepwise_core::config::AppConfig;
use stepwise_core::{InsertPosition, LogicOperator, StepwiseError};

#[test]
fn test_load_full_config_from_file() {
    let toml_content = r#"
[editor]
default_operator = "OR"
new_function_position = "tail"

[migration]
failure_threshold = 25

[log]
level = "stepwise=debug,warn"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.editor.default_operator, LogicOperator::Or);
    assert_eq!(config.editor.new_function_position, InsertPosition::Tail);
    assert_eq!(config.migration.failure_threshold, 25);
    assert_eq!(config.log.level, "stepwise=debug,warn");
}

#[test]
fn test_env_var_expansion_in_config() {
    std::env::set_var("STEPWISE_TEST_LOG_LEVEL", "trace");

    let toml_content = r#"
[log]
level = "${STEPWISE_TEST_LOG_LEVEL}"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");
    assert_eq!(config.log.level, "trace");

    std::env::remove_var("STEPWISE_TEST_LOG_LEVEL");
}

#[test]
fn test_minimal_config_uses_defaults() {
    let toml_content = r#"
[editor]
default_operator = "AND"
"#;

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(toml_content.as_bytes()).expect("write toml");

    let config = AppConfig::load(tmp.path()).expect("load config");

    assert_eq!(config.editor.new_function_position, InsertPosition::Head);
    assert_eq!(config.migration.failure_threshold, 10);
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_missing_file_is_config_not_found() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("stepwise.toml");

    let err = AppConfig::load(&path).unwrap_err();
    assert!(matches!(err, StepwiseError::ConfigNotFound(_)));

    let config = AppConfig::load_or_default(&path).expect("defaults");
    assert_eq!(config.migration.failure_threshold, 10);
}

#[test]
fn test_invalid_values_rejected() {
    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(b"[editor]\ndefault_operator = \"XOR\"\n").expect("write toml");
    assert!(matches!(AppConfig::load(tmp.path()), Err(StepwiseError::Config(_))));

    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    tmp.write_all(b"[migration]\nfailure_threshold = 0\n").expect("write toml");
    assert!(matches!(AppConfig::load(tmp.path()), Err(StepwiseError::Config(_))));
}
