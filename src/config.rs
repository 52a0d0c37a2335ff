//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.codedash.toml` files.

use crate::analysis::aggregator::{AggregateOptions, DescriptiveCounting, DEFAULT_TOP_INVIVO};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".codedash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Dataset location.
    #[serde(default)]
    pub data: DataConfig,

    /// Aggregation settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Offline report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl ServerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Dataset location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory containing the JSON table files.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of in-vivo codes in the top view.
    #[serde(default = "default_top_invivo")]
    pub top_invivo_limit: usize,

    /// How repeated descriptive codes feed `responseCount`.
    #[serde(default)]
    pub descriptive_counting: DescriptiveCounting,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_invivo_limit: default_top_invivo(),
            descriptive_counting: DescriptiveCounting::default(),
        }
    }
}

fn default_top_invivo() -> usize {
    DEFAULT_TOP_INVIVO
}

impl From<&AnalysisConfig> for AggregateOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            top_invivo_limit: config.top_invivo_limit,
            descriptive_counting: config.descriptive_counting,
        }
    }
}

/// Offline report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include every coded response under its question.
    #[serde(default)]
    pub include_responses: bool,

    /// Maximum rows per usage table.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_responses: false,
            max_rows: default_max_rows(),
        }
    }
}

fn default_max_rows() -> usize {
    20
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
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.data_dir {
            self.data.dir = dir.clone();
        }
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(limit) = args.top_invivo {
            self.analysis.top_invivo_limit = limit;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Reject settings that would silently produce empty output.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.top_invivo_limit == 0 {
            bail!("Invalid config: analysis.top_invivo_limit must be at least 1");
        }
        if self.report.max_rows == 0 {
            bail!("Invalid config: report.max_rows must be at least 1");
        }
        Ok(())
    }

    /// Aggregation options derived from the `[analysis]` section.
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions::from(&self.analysis)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
