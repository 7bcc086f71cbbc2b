use crate::models::{FilterConfig, UserConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Prefix for environment overrides, e.g. `LOTTOFILTER__SETTINGS__DEBUG_MODE=true`
pub const ENV_PREFIX: &str = "LOTTOFILTER";

/// Where the loaded settings point, resolved against the config directory.
///
/// Configuration is read before logging can be set up, so the binary logs this
/// once the subscriber is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSummary {
    pub config_dir: Utf8PathBuf,
    pub settings_found: bool,
    pub filters_found: bool,
    pub history_path: Utf8PathBuf,
    pub log_dir: Utf8PathBuf,
    pub export_path: Utf8PathBuf,
    pub debug_mode: bool,
}

impl ConfigSummary {
    pub fn log(&self) {
        if !self.settings_found {
            tracing::warn!(
                "No settings.yaml in {}, using defaults and environment overrides",
                self.config_dir
            );
        }
        tracing::info!(
            "Loaded configuration from {} - history: {}, logs: {}, export: {}, debug: {}, filters.yaml present: {}",
            self.config_dir,
            self.history_path,
            self.log_dir,
            self.export_path,
            self.debug_mode,
            self.filters_found
        );
    }
}

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages two configuration files:
/// - User config (`settings.yaml`): paths, debug mode, default page; layered with
///   environment overrides
/// - Filter config (`filters.yaml`): the ordered condition list, read only
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
    filter_config_path: Utf8PathBuf,
    env_prefix: String,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (created if missing)
    ///
    /// # Returns
    /// A new ConfigManager instance
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        // Create config directory if it doesn't exist
        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join("settings.yaml"),
            filter_config_path: config_dir.join("filters.yaml"),
            config_dir,
            env_prefix: ENV_PREFIX.to_string(),
        })
    }

    /// Use a different environment variable prefix for overrides.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load the user configuration.
    ///
    /// `settings.yaml` is optional. Environment variables named
    /// `<PREFIX>__SETTINGS__<FIELD>` override individual fields.
    ///
    /// # Returns
    /// The loaded UserConfig, with defaults for anything not set
    pub fn load_user_config(&self) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
        }

        let layered = config::Config::builder()
            .add_source(
                config::File::new(self.user_config_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Save the user configuration file.
    ///
    /// # Arguments
    /// * `config` - The UserConfig to save
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Load the filter configuration file.
    ///
    /// # Returns
    /// The loaded FilterConfig, or an empty one if the file doesn't exist
    pub fn load_filter_config(&self) -> Result<FilterConfig> {
        if !self.filter_config_path.exists() {
            tracing::warn!(
                "Filter config file not found at {}, starting with no conditions",
                self.filter_config_path
            );
            return Ok(FilterConfig::default());
        }

        let file_contents = fs::read_to_string(&self.filter_config_path).with_context(|| {
            format!("Failed to read filter config: {}", self.filter_config_path)
        })?;

        let config: FilterConfig = serde_yaml_ng::from_str(&file_contents).with_context(|| {
            format!("Failed to parse filter config: {}", self.filter_config_path)
        })?;

        tracing::info!(
            "Loaded {} conditions from {}",
            config.conditions.len(),
            self.filter_config_path
        );
        Ok(config)
    }

    /// Resolve a configured path: relative paths are taken from the config directory.
    pub fn resolve_path(&self, path: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    /// Resolve the paths in `config` and note which files exist
    pub fn summarize(&self, config: &UserConfig) -> ConfigSummary {
        let settings = &config.settings;
        ConfigSummary {
            config_dir: self.config_dir.clone(),
            settings_found: self.user_config_path.exists(),
            filters_found: self.filter_config_path.exists(),
            history_path: self.resolve_path(&settings.history_file),
            log_dir: self.resolve_path(&settings.log_dir),
            export_path: self.resolve_path(&settings.export_path),
            debug_mode: settings.debug_mode,
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }

    pub fn filter_config_path(&self) -> &Utf8Path {
        &self.filter_config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager(prefix: &str) -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path)
            .unwrap()
            .with_env_prefix(prefix);
        (manager, temp_dir)
    }

    #[test]
    fn test_create_config_manager() {
        let (manager, _temp_dir) = create_test_config_manager("LF_UNIT_CREATE");
        assert!(manager.config_dir().exists());
        assert_eq!(manager.user_config_path().file_name(), Some("settings.yaml"));
    }

    #[test]
    fn test_missing_user_config_uses_defaults() {
        let (manager, _temp_dir) = create_test_config_manager("LF_UNIT_DEFAULTS");
        let loaded = manager.load_user_config().unwrap();
        assert_eq!(loaded, UserConfig::default());
    }

    #[test]
    fn test_load_save_user_config() {
        let (manager, _temp_dir) = create_test_config_manager("LF_UNIT_SAVE");

        let mut config = UserConfig::default();
        config.settings.start_page = 4;
        config.settings.debug_mode = true;
        manager.save_user_config(&config).unwrap();

        let loaded = manager.load_user_config().unwrap();
        assert_eq!(loaded.settings.start_page, 4);
        assert!(loaded.settings.debug_mode);
        assert_eq!(loaded.settings.history_file, "winning-history.csv");
    }

    #[test]
    fn test_env_override() {
        let (manager, _temp_dir) = create_test_config_manager("LF_UNIT_ENV");
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var("LF_UNIT_ENV__SETTINGS__EXPORT_PATH", "env.csv") };

        let loaded = manager.load_user_config().unwrap();
        assert_eq!(loaded.settings.export_path, "env.csv");

        unsafe { std::env::remove_var("LF_UNIT_ENV__SETTINGS__EXPORT_PATH") };
    }

    #[test]
    fn test_missing_filter_config_is_empty() {
        let (manager, _temp_dir) = create_test_config_manager("LF_UNIT_FILTERS");
        assert!(manager.load_filter_config().unwrap().conditions.is_empty());
    }

    #[test]
    fn test_resolve_path() {
        let (manager, _temp_dir) = create_test_config_manager("LF_UNIT_RESOLVE");
        assert_eq!(
            manager.resolve_path("history.csv"),
            manager.config_dir().join("history.csv")
        );
        let absolute = manager.config_dir().join("abs.csv");
        assert_eq!(manager.resolve_path(&absolute), absolute);
    }

    #[test]
    fn test_summary_resolves_paths() {
        let (manager, _temp_dir) = create_test_config_manager("LF_UNIT_SUMMARY");

        let defaults = manager.load_user_config().unwrap();
        let summary = manager.summarize(&defaults);
        assert!(!summary.settings_found);
        assert!(!summary.filters_found);
        assert_eq!(summary.config_dir.as_path(), manager.config_dir());
        assert_eq!(
            summary.history_path,
            manager.config_dir().join("winning-history.csv")
        );
        assert_eq!(summary.log_dir, manager.config_dir().join("logs"));

        let mut config = UserConfig::default();
        config.settings.debug_mode = true;
        manager.save_user_config(&config).unwrap();
        let summary = manager.summarize(&manager.load_user_config().unwrap());
        assert!(summary.settings_found);
        assert!(summary.debug_mode);
    }
}
