//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sectorlens.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".sectorlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Chart view settings.
    #[serde(default)]
    pub views: ViewsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "sectorlens_report.md".to_string()
}

/// Analytics API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the analytics API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the endpoint returning every record.
    #[serde(default = "default_records_path")]
    pub records_path: String,

    /// Path of the server-side filter endpoint.
    #[serde(default = "default_filter_path")]
    pub filter_path: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Number of retries on transient failure.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Base delay between retries; doubles on each attempt.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            records_path: default_records_path(),
            filter_path: default_filter_path(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

fn default_base_url() -> String {
    "https://coffer-api.vercel.app".to_string()
}

fn default_records_path() -> String {
    "/api/v1/getAnalytic".to_string()
}

fn default_filter_path() -> String {
    "/api/v1/getAnalytic/getFilterData".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> usize {
    2
}

fn default_retry_backoff() -> u64 {
    500
}

/// Chart view settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Drop records lacking the label or value a view plots.
    #[serde(default)]
    pub drop_incomplete: bool,
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum values listed per filter-option vocabulary.
    #[serde(default = "default_max_vocabulary_values")]
    pub max_vocabulary_values: usize,

    /// Width in characters of the longest histogram bar.
    #[serde(default = "default_bar_width")]
    pub histogram_bar_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_vocabulary_values: default_max_vocabulary_values(),
            histogram_bar_width: default_bar_width(),
        }
    }
}

fn default_max_vocabulary_values() -> usize {
    25
}

fn default_bar_width() -> usize {
    40
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.sectorlens.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }

        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        if let Some(retries) = args.retries {
            self.api.retries = retries;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Flags always override
        if args.drop_incomplete {
            self.views.drop_incomplete = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
