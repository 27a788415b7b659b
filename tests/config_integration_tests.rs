//! Integration tests for ConfigManager and settings file handling
//!
//! These tests verify:
//! - Defaults when no settings file exists
//! - Settings file round-trips and partial files
//! - Environment overrides layered over the file
//! - Rejection of unusable loader limits
//! - A loader built from loaded settings

use camino::Utf8PathBuf;
use octoarcade::models::settings::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_FILE_SIZE};
use octoarcade::{AppConfig, ConfigManager, ConfigurationLoader, MemorySource};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Each test passes its own prefix so parallel tests never see each other's variables
fn create_test_manager(prefix: &str) -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let manager = ConfigManager::new(&config_path)
        .unwrap()
        .with_env_prefix(prefix);
    (temp_dir, manager)
}

#[test]
fn test_create_config_manager_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested = Utf8PathBuf::try_from(temp_dir.path().join("settings").join("arcade")).unwrap();

    let manager = ConfigManager::new(&nested).unwrap();

    assert!(nested.exists());
    assert_eq!(manager.config_dir(), nested.as_path());
    assert_eq!(manager.settings_path(), nested.join("octoarcade.yaml").as_path());
}

#[test]
fn test_load_defaults_without_file() {
    let (_temp_dir, manager) = create_test_manager("OCTOARCADE_ITEST_DEFAULTS");

    let config = manager.load_config().unwrap();

    assert_eq!(config, AppConfig::default());
    assert_eq!(config.loader.max_file_size, DEFAULT_MAX_FILE_SIZE);
    assert_eq!(config.loader.chunk_size, DEFAULT_CHUNK_SIZE);
    assert_eq!(config.loader.allowed_extensions, vec!["json".to_string()]);
    assert_eq!(config.logging.log_dir, "logs");
}

#[test]
fn test_save_and_reload_round_trip() {
    let (_temp_dir, manager) = create_test_manager("OCTOARCADE_ITEST_ROUND_TRIP");

    let mut config = AppConfig::default();
    config.loader.max_games = 250;
    config.loader.chunk_size = 5;
    config.loader.yield_delay_ms = 0;
    config.loader.allowed_extensions = vec!["json".to_string(), "arcade".to_string()];
    config.logging.console_output = false;

    manager.save_config(&config).unwrap();
    assert!(manager.settings_path().exists());

    let loaded = manager.load_config().unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_keeps_remaining_defaults() {
    let (_temp_dir, manager) = create_test_manager("OCTOARCADE_ITEST_PARTIAL");
    fs::write(manager.settings_path(), "loader:\n  max_games: 40\n").unwrap();

    let config = manager.load_config().unwrap();

    assert_eq!(config.loader.max_games, 40);
    assert_eq!(config.loader.chunk_size, DEFAULT_CHUNK_SIZE);
    assert_eq!(config.logging, AppConfig::default().logging);
}

#[test]
fn test_environment_overrides_file() {
    let prefix = "OCTOARCADE_ITEST_ENV";
    let (_temp_dir, manager) = create_test_manager(prefix);
    fs::write(
        manager.settings_path(),
        "loader:\n  chunk_size: 20\n  max_games: 500\n",
    )
    .unwrap();

    // SAFETY: the variable names are unique to this test
    unsafe {
        std::env::set_var("OCTOARCADE_ITEST_ENV_LOADER__CHUNK_SIZE", "7");
        std::env::set_var("OCTOARCADE_ITEST_ENV_LOGGING__DEBUG_MODE", "true");
    }

    let config = manager.load_config().unwrap();

    unsafe {
        std::env::remove_var("OCTOARCADE_ITEST_ENV_LOADER__CHUNK_SIZE");
        std::env::remove_var("OCTOARCADE_ITEST_ENV_LOGGING__DEBUG_MODE");
    }

    assert_eq!(config.loader.chunk_size, 7);
    assert_eq!(config.loader.max_games, 500);
    assert!(config.logging.debug_mode);
}

#[test]
fn test_invalid_limits_rejected() {
    let (_temp_dir, manager) = create_test_manager("OCTOARCADE_ITEST_INVALID");

    fs::write(manager.settings_path(), "loader:\n  max_games: 0\n").unwrap();
    let err = manager.load_config().unwrap_err();
    assert!(format!("{:#}", err).contains("max_games"));

    fs::write(manager.settings_path(), "loader:\n  max_file_size: 0\n").unwrap();
    let err = manager.load_config().unwrap_err();
    assert!(format!("{:#}", err).contains("max_file_size"));
}

#[test]
fn test_unparseable_file_reports_path() {
    let (_temp_dir, manager) = create_test_manager("OCTOARCADE_ITEST_UNPARSEABLE");
    fs::write(manager.settings_path(), "loader: [this is: not a map").unwrap();

    let err = manager.load_config().unwrap_err();
    assert!(err.to_string().contains("octoarcade.yaml"));
}

#[tokio::test]
async fn test_loader_uses_loaded_settings() {
    let (_temp_dir, manager) = create_test_manager("OCTOARCADE_ITEST_LOADER");
    fs::write(
        manager.settings_path(),
        "loader:\n  chunk_size: 3\n  yield_delay_ms: 0\n",
    )
    .unwrap();

    let config = manager.load_config().unwrap();
    let loader = ConfigurationLoader::new(config.loader);

    let games: Vec<_> = (0..7).map(|i| json!({ "name": format!("Game {i}") })).collect();
    let source = MemorySource::new("seven.json", json!({ "games": games }).to_string());

    let mut sizes = Vec::new();
    loader
        .load(&source, |_, _| {}, |chunk, _, _| sizes.push(chunk.len()))
        .await
        .unwrap();

    assert_eq!(sizes, vec![3, 3, 1]);
}
