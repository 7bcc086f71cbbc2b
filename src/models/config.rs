use crate::rules::RuleParameters;
use serde::{Deserialize, Serialize};

/// Application settings from `settings.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub settings: FilterSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Local record store of past first-prize draws
    #[serde(default = "default_history_file")]
    pub history_file: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default = "default_export_path")]
    pub export_path: String,

    /// 1-based page shown after a scan when none is given on the command line
    #[serde(default = "default_start_page")]
    pub start_page: usize,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            log_dir: default_log_dir(),
            debug_mode: false,
            export_path: default_export_path(),
            start_page: default_start_page(),
        }
    }
}

fn default_history_file() -> String {
    "winning-history.csv".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_export_path() -> String {
    "filtered_combinations.csv".to_string()
}

fn default_start_page() -> usize {
    1
}

/// Ordered list of rule instances from `filters.yaml`.
///
/// This file is only read; the engine never writes filter configurations back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub conditions: Vec<ConditionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    pub rule: String,

    #[serde(default)]
    pub parameters: RuleParameters,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_config_defaults() {
        let yaml = "conditions:\n  - rule: SumOutsideRange\n    parameters:\n      MIN: \"100\"\n      MAX: 180\n  - rule: DecadeClusterLimit\n    enabled: false\n";
        let config: FilterConfig = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(config.conditions.len(), 2);
        assert_eq!(config.conditions[0].rule, "SumOutsideRange");
        assert_eq!(config.conditions[0].parameters.get("min"), Some("100"));
        assert_eq!(config.conditions[0].parameters.get("MAX"), Some("180"));
        assert!(config.conditions[0].enabled);
        assert!(config.conditions[1].parameters.is_empty());
        assert!(!config.conditions[1].enabled);
    }

    #[test]
    fn test_user_config_defaults() {
        let config: UserConfig = serde_yaml_ng::from_str("settings: {}").unwrap();
        assert_eq!(config.settings, FilterSettings::default());
        assert_eq!(config.settings.start_page, 1);
    }
}
