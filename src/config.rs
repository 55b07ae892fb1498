//! Configuration management for the compatibility checker
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (compat.toml)
//! - Environment variables (COMPAT__*)
//!
//! ## Example config file (compat.toml):
//! ```toml
//! [check]
//! number_policy = "unified"
//! root_context = "response"
//!
//! [fetch]
//! timeout_secs = 10
//! user_agent = "response-compat/0.1"
//! accept = "application/json"
//!
//! [output]
//! format = "json"
//! show_diff = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::compatibility::{CompatibilityChecker, ROOT_CONTEXT};
use crate::kind::NumberPolicy;
use crate::report::{OutputFormat, Reporter};

/// Main configuration for the checker
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompatConfig {
    /// Comparison settings
    #[serde(default)]
    pub check: CheckConfig,

    /// HTTP fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Report settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Comparison configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Whether integers and floats are distinct kinds
    #[serde(default)]
    pub number_policy: NumberPolicy,

    /// Label reported for top-level mismatches
    #[serde(default = "default_root_context")]
    pub root_context: String,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept header sent with requests
    #[serde(default = "default_accept")]
    pub accept: String,
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format (text or json)
    #[serde(default)]
    pub format: OutputFormat,

    /// Append a line diff of the mismatching fragments
    #[serde(default)]
    pub show_diff: bool,
}

// Default value functions
fn default_root_context() -> String {
    ROOT_CONTEXT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("response-compat/{}", env!("CARGO_PKG_VERSION"))
}

fn default_accept() -> String {
    "application/json".to_string()
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            number_policy: NumberPolicy::default(),
            root_context: default_root_context(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            accept: default_accept(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            show_diff: false,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CompatConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "compat.toml",
            ".compat.toml",
            "config/compat.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "response-compat") {
            let xdg_config = config_dir.config_dir().join("compat.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (COMPAT__*)
        builder = builder.add_source(
            Environment::with_prefix("COMPAT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Build a checker from the `[check]` section
    pub fn checker(&self) -> CompatibilityChecker {
        CompatibilityChecker::new()
            .number_policy(self.check.number_policy)
            .root_context(self.check.root_context.clone())
    }

    /// Build a reporter from the `[output]` section
    pub fn reporter(&self) -> Reporter {
        Reporter::new(self.output.format).with_diff(self.output.show_diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = CompatConfig::default();
        assert_eq!(config.check.number_policy, NumberPolicy::Strict);
        assert_eq!(config.check.root_context, "root");
        assert_eq!(config.fetch.timeout(), Duration::from_secs(30));
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(!config.output.show_diff);
    }

    #[test]
    fn test_serialize_config() {
        let config = CompatConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[check]"));
        assert!(toml_str.contains("[fetch]"));
        assert!(toml_str.contains("number_policy = \"strict\""));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[check]\nnumber_policy = \"unified\"\n\n[output]\nformat = \"json\"\n",
        )
        .unwrap();

        let config = CompatConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.check.number_policy, NumberPolicy::Unified);
        assert_eq!(config.check.root_context, "root");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.fetch.timeout_secs, 30);
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = CompatConfig::default();
        config.check.root_context = "body".to_string();
        config.fetch.timeout_secs = 5;
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = CompatConfig::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.check.root_context, "body");
        assert_eq!(loaded.fetch.timeout_secs, 5);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        // only touches number_policy, which no other test loads with a different expectation
        std::env::set_var("COMPAT__CHECK__NUMBER_POLICY", "unified");
        let loaded = CompatConfig::load();
        std::env::remove_var("COMPAT__CHECK__NUMBER_POLICY");

        let config = loaded.unwrap();
        assert_eq!(config.check.number_policy, NumberPolicy::Unified);
        assert_eq!(config.check.root_context, "root");
    }

    #[test]
    fn test_checker_uses_number_policy() {
        let mut config = CompatConfig::default();
        config.check.number_policy = NumberPolicy::Unified;
        assert!(config.checker().check(&json!(1), &json!(2.5)).is_ok());
    }
}
