//! Integration tests for ConfigManager
//!
//! These tests verify:
//! - Filter lists load from YAML with defaults applied
//! - User settings layer file values under environment overrides
//! - Invalid files are reported as errors rather than silently replaced

use camino::Utf8PathBuf;
use lottofilter::{ConfigManager, UserConfig};
use std::fs;
use tempfile::TempDir;

fn manager(prefix: &str) -> (ConfigManager, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let dir = Utf8PathBuf::try_from(temp_dir.path().join("LottoFilter Data")).unwrap();
    let manager = ConfigManager::new(&dir).unwrap().with_env_prefix(prefix);
    (manager, temp_dir)
}

#[test]
fn test_config_dir_is_created() {
    let (manager, _temp_dir) = manager("LF_IT_CREATE");
    assert!(manager.config_dir().is_dir());
    assert_eq!(
        manager.filter_config_path().file_name(),
        Some("filters.yaml")
    );
}

#[test]
fn test_load_filter_config() {
    let (manager, _temp_dir) = manager("LF_IT_FILTERS");
    fs::write(
        manager.filter_config_path(),
        r#"
conditions:
  - rule: SumOutsideRange
    parameters:
      MIN: 100
      MAX: "170"
  - rule: ConsecutiveNumberConstraint
    parameters:
      MaxPairs: 0
    enabled: false
  - rule: HistoricalFirstPrizeExclude
"#,
    )
    .unwrap();

    let config = manager.load_filter_config().unwrap();

    assert_eq!(config.conditions.len(), 3);
    assert_eq!(config.conditions[0].parameters.get("min"), Some("100"));
    assert_eq!(config.conditions[0].parameters.get("max"), Some("170"));
    assert!(!config.conditions[1].enabled);
    assert_eq!(config.conditions[1].parameters.get("MaxPairs"), Some("0"));
    assert!(config.conditions[2].enabled);
    assert!(config.conditions[2].parameters.is_empty());
}

#[test]
fn test_invalid_filter_config_is_an_error() {
    let (manager, _temp_dir) = manager("LF_IT_INVALID");
    fs::write(manager.filter_config_path(), "conditions: [rule: {").unwrap();

    let error = manager.load_filter_config().unwrap_err();
    assert!(error.to_string().contains("filters.yaml"));
}

#[test]
fn test_user_config_file_values() {
    let (manager, _temp_dir) = manager("LF_IT_FILE");
    fs::write(
        manager.user_config_path(),
        "settings:\n  history_file: draws.csv\n  start_page: 3\n",
    )
    .unwrap();

    let config = manager.load_user_config().unwrap();

    assert_eq!(config.settings.history_file, "draws.csv");
    assert_eq!(config.settings.start_page, 3);
    assert_eq!(config.settings.log_dir, "logs");
    assert!(!config.settings.debug_mode);
    assert_eq!(
        manager.resolve_path(&config.settings.history_file),
        manager.config_dir().join("draws.csv")
    );
}

#[test]
fn test_environment_overrides_file() {
    let (manager, _temp_dir) = manager("LF_IT_ENV");
    fs::write(
        manager.user_config_path(),
        "settings:\n  debug_mode: false\n  start_page: 2\n",
    )
    .unwrap();

    // SAFETY: the variable names are unique to this test
    unsafe {
        std::env::set_var("LF_IT_ENV__SETTINGS__DEBUG_MODE", "true");
        std::env::set_var("LF_IT_ENV__SETTINGS__START_PAGE", "9");
    }

    let config = manager.load_user_config().unwrap();

    unsafe {
        std::env::remove_var("LF_IT_ENV__SETTINGS__DEBUG_MODE");
        std::env::remove_var("LF_IT_ENV__SETTINGS__START_PAGE");
    }

    assert!(config.settings.debug_mode);
    assert_eq!(config.settings.start_page, 9);
}

#[test]
fn test_save_then_load_user_config() {
    let (manager, _temp_dir) = manager("LF_IT_SAVE");

    let mut config = UserConfig::default();
    config.settings.export_path = "out/filtered.csv".to_string();
    manager.save_user_config(&config).unwrap();

    assert!(manager.user_config_path().exists());
    assert_eq!(manager.load_user_config().unwrap(), config);
}
