use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the downloaded registry file(s)
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory the crosswalk files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Fuzzy match acceptance threshold (0.0 - 1.0)
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

fn default_data_dir() -> String {
    "data/gcpt".to_string()
}

fn default_output_dir() -> String {
    "data/crosswalks".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fuzzy_threshold() -> f64 {
    plantxwalk_core::DEFAULT_THRESHOLD
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            log_level: default_log_level(),
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, falling back to defaults when it is absent
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}
