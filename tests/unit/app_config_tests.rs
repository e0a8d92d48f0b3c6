/*!
 * Tests for configuration loading and validation
 */

use std::time::Duration;

use inscriptor::app_config::{Config, LogLevel};
use tempfile::TempDir;

#[test]
fn test_loadOrCreate_withExistingFile_shouldKeepDefaultsForMissingFields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{
            "log_level": "debug",
            "storage_dir": "/var/lib/inscriptor/objects",
            "providers": {
                "libre_translate": { "endpoint": "http://localhost:5000", "timeout_secs": 3 }
            }
        }"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();

    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.providers.libre_translate.endpoint, "http://localhost:5000");
    assert_eq!(config.providers.libre_translate.timeout(), Duration::from_secs(3));
    assert!(config.providers.libre_translate.enabled);
    assert_eq!(config.providers.google_vision.endpoint, "https://vision.googleapis.com");
    assert!(config.database_path.is_none());
    config.validate().unwrap();
}

#[test]
fn test_loadOrCreate_withBrokenJson_shouldFail() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{ not json").unwrap();

    let error = Config::load_or_create(&path).unwrap_err();

    assert!(format!("{:#}", error).contains("Failed to parse config file"));
}

#[test]
fn test_loadOrCreate_shouldRoundTripWrittenDefault() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.json");

    let created = Config::load_or_create(&path).unwrap();
    let reloaded = Config::load_or_create(&path).unwrap();

    assert_eq!(created, reloaded);
    // Credentials never end up in the file
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(!written.to_lowercase().contains("api_key"));
}

#[test]
fn test_validate_withUnparseableEndpoint_shouldFail() {
    let mut config = Config::default();
    config.providers.google_translate.endpoint = "not a url".to_string();

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withNonPositiveSpeakingRate_shouldFail() {
    let mut config = Config::default();
    config.providers.google_tts.audio.speaking_rate = 0.0;

    assert!(config.validate().is_err());
}

#[test]
fn test_resolvedDatabasePath_withExplicitPath_shouldUseIt() {
    let mut config = Config::default();
    config.database_path = Some("/tmp/inscriptor-test.db".into());

    assert_eq!(
        config.resolved_database_path().unwrap(),
        std::path::PathBuf::from("/tmp/inscriptor-test.db")
    );
}
