use gitfolio::retry::RetryPolicy;
use gitfolio_config::{Config, ConfigError, LogLevel};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.api_url, "http://localhost:8000");
    assert!(!config.allow_http);
    assert_eq!(config.cache_timeout_secs, 10);
    assert_eq!(config.compute_timeout_secs, None);
    assert_eq!(config.settle_delay_ms, 500);
    assert_eq!(config.artifacts.max_retries, 5);
    assert_eq!(config.artifacts.base_delay_ms, 300);
    assert_eq!(config.artifacts.initial_delay_ms, 200);
    assert_eq!(config.log_level, LogLevel::Off);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_builders() {
    let config = Config::new()
        .with_api_url("https://portfolio.example.com/")
        .with_settle_delay_ms(0);
    assert_eq!(config.api_base(), "https://portfolio.example.com");
    assert_eq!(config.settle_delay(), Duration::ZERO);
}

#[test]
fn test_save_and_load_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.yaml");

    let mut config = Config::new().with_api_url("https://portfolio.example.com");
    config.compute_timeout_secs = Some(120);
    config.artifacts.max_retries = 8;
    config.log_level = LogLevel::Debug;
    config.save_to(&path).unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("yaml.tmp").exists());
    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_partial_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "api_url: https://api.example.com\nartifacts:\n  max_retries: 2\n").unwrap();

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.api_url, "https://api.example.com");
    assert_eq!(config.artifacts.max_retries, 2);
    assert_eq!(config.artifacts.base_delay_ms, 300);
    assert_eq!(config.settle_delay_ms, 500);

    let policy = RetryPolicy::from_config(&config.artifacts);
    assert_eq!(policy.max_retries, 2);
    assert_eq!(policy.worst_case_wait(), Duration::from_millis(200 + 300 + 600));
}

#[test]
fn test_empty_file_is_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "\n").unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_invalid_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "api_url: ftp://files.example.com\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    let config_err = err.downcast_ref::<ConfigError>().unwrap();
    assert!(matches!(config_err, ConfigError::Validation(_)));
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.yaml");
    fs::write(&path, "artifacts: [unclosed\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Parse(_))
    ));
}

#[test]
fn test_validation_rules() {
    let mut config = Config::default();
    config.artifacts.max_retries = 21;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.artifacts.base_delay_ms = 0;
    assert!(config.validate().is_err());

    let config = Config::new().with_api_url("not a url");
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn test_missing_file_is_an_error_for_explicit_path() {
    let temp_dir = TempDir::new().unwrap();
    let err = Config::load_from(&temp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Io(_))
    ));
}
