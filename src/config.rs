use crate::constants::DEFAULT_SPONSORS;
use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default = "default_sponsors")]
    pub sponsors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of records to download per run.
    pub max_records: usize,
    /// Studies requested per page.
    pub page_size: usize,
    /// Retries after a failed page request before giving up on the page.
    pub max_retries: u32,
    /// Fixed delay between retries, in seconds.
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the six taxonomy JSON files.
    pub keywords_dir: String,
    /// Directory the CSV tables are written to.
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            paths: PathsConfig::default(),
            sponsors: default_sponsors(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_records: 10_000,
            page_size: 1_000,
            max_retries: 5,
            retry_delay_secs: 5,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            keywords_dir: "keywords".to_string(),
            output_dir: "output".to_string(),
        }
    }
}

fn default_sponsors() -> Vec<String> {
    DEFAULT_SPONSORS.iter().map(|s| s.to_string()).collect()
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ScraperError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Loads the config file, falling back to compiled-in defaults when
    /// it is absent. A malformed file still fails the run.
    pub fn load_or_default<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            warn!(
                "Config file '{}' not found, using defaults",
                config_path.display()
            );
            return Ok(Config::default());
        }
        Config::load(config_path)
    }
}
