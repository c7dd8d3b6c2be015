//! Benchmark configuration
//!
//! Read from `config.toml` in the platform config directory, or from the
//! file named by `PAIRBENCH_CONFIG`. Every field has a default, so a missing
//! file is the same as an empty one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "pairbench";
const CONFIG_ENV: &str = "PAIRBENCH_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of context samples to evaluate
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,
    /// Number of catalog queries asked per sample
    #[serde(default = "default_num_queries")]
    pub num_queries: usize,
    /// Accuracy of the reference system reports are compared against
    #[serde(default = "default_baseline_accuracy")]
    pub baseline_accuracy: f64,
    /// Predicted answers are truncated to this many characters in outcomes
    #[serde(default = "default_max_predicted_chars")]
    pub max_predicted_chars: usize,
    /// Query catalog file or directory; the built-in catalog when unset
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

fn default_num_samples() -> usize {
    20
}

fn default_num_queries() -> usize {
    20
}

// RLM (GPT-5) on OOLONG-Pairs
fn default_baseline_accuracy() -> f64 {
    0.58
}

fn default_max_predicted_chars() -> usize {
    500
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            num_samples: default_num_samples(),
            num_queries: default_num_queries(),
            baseline_accuracy: default_baseline_accuracy(),
            max_predicted_chars: default_max_predicted_chars(),
            catalog_path: None,
        }
    }
}

impl BenchmarkConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse benchmark config")
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Resolve and load configuration
    ///
    /// An explicit path wins, then `PAIRBENCH_CONFIG`, then the platform
    /// config file if it exists. Otherwise defaults are used.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }

        match get_config_file() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn get_config_file() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = BenchmarkConfig::from_toml("").unwrap();
        assert_eq!(config.num_samples, 20);
        assert_eq!(config.num_queries, 20);
        assert_eq!(config.baseline_accuracy, 0.58);
        assert_eq!(config.max_predicted_chars, 500);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = BenchmarkConfig::from_toml(
            r#"
num_samples = 5
catalog_path = "catalogs/extra.toml"
"#,
        )
        .unwrap();
        assert_eq!(config.num_samples, 5);
        assert_eq!(config.num_queries, 20);
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("catalogs/extra.toml"))
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(BenchmarkConfig::from_toml("num_samples = \"many\"").is_err());
    }
}
