use crate::Result;
use chrono::{DateTime, Utc};
use ocusage_providers::RetryPolicy;
use ocusage_types::GroupingStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides the OpenCode executable
pub const OPENCODE_BIN_ENV: &str = "OCUSAGE_OPENCODE_BIN";

/// Persistent defaults read from `config.toml`
///
/// Every key is optional; unset keys fall back to built-in defaults and
/// command-line flags override both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<GroupingStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_reasoning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opencode_bin: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::default_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(ocusage_core::default_config_path()?)
    }

    /// Starter file written by `ocusage config init`
    pub fn starter() -> Self {
        Self {
            grouping: Some(GroupingStrategy::default()),
            include_reasoning: Some(true),
            max_retries: Some(RetryPolicy::default().max_retries),
            ..Self::default()
        }
    }
}

/// Everything one export run needs to know
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub overwrite: bool,
    /// Only sessions created at or after this instant
    pub since: Option<DateTime<Utc>>,
    pub include_reasoning_in_output: bool,
    /// `None` or zero selects a value from the CPU count
    pub concurrency: Option<usize>,
    /// Skip sessions whose output file is newer than their last update
    pub incremental: bool,
    pub skip_validation: bool,
    pub dry_run: bool,
    pub verbose: bool,
    pub grouping: GroupingStrategy,
    pub storage_root: Option<PathBuf>,
    pub opencode_bin: PathBuf,
    pub retry: RetryPolicy,
}

impl ExportOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            overwrite: false,
            since: None,
            include_reasoning_in_output: true,
            concurrency: None,
            incremental: false,
            skip_validation: false,
            dry_run: false,
            verbose: false,
            grouping: GroupingStrategy::default(),
            storage_root: None,
            opencode_bin: PathBuf::from("opencode"),
            retry: RetryPolicy::default(),
        }
    }

    /// Built-in defaults layered with the config file and environment
    pub fn from_config(config: &Config) -> Result<Self> {
        let output_dir = match &config.output_dir {
            Some(dir) => ocusage_core::expand_tilde(&dir.to_string_lossy()),
            None => ocusage_core::default_output_dir()?,
        };

        let mut options = Self::new(output_dir);
        if let Some(grouping) = config.grouping {
            options.grouping = grouping;
        }
        if let Some(include) = config.include_reasoning {
            options.include_reasoning_in_output = include;
        }
        options.concurrency = config.concurrency;
        if let Some(max_retries) = config.max_retries {
            options.retry.max_retries = max_retries;
        }
        options.storage_root = config.storage_dir.clone();

        if let Ok(bin) = std::env::var(OPENCODE_BIN_ENV)
            && !bin.trim().is_empty()
        {
            options.opencode_bin = PathBuf::from(bin);
        } else if let Some(bin) = &config.opencode_bin {
            options.opencode_bin = bin.clone();
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.grouping, None);
        assert_eq!(config.output_dir, None);
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            output_dir: Some(PathBuf::from("/data/ocusage")),
            grouping: Some(GroupingStrategy::Project),
            concurrency: Some(4),
            ..Config::default()
        };

        config.save_to(&config_path)?;
        assert!(config_path.exists());

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded, config);

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path)?;
        assert_eq!(config, Config::default());

        Ok(())
    }

    #[test]
    fn test_malformed_config_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "grouping = \"sideways\"\n")?;

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));

        Ok(())
    }

    #[test]
    fn test_options_layer_config_values() -> Result<()> {
        let config = Config {
            output_dir: Some(PathBuf::from("/data/out")),
            grouping: Some(GroupingStrategy::Flat),
            include_reasoning: Some(false),
            max_retries: Some(5),
            storage_dir: Some(PathBuf::from("/data/storage")),
            ..Config::default()
        };

        let options = ExportOptions::from_config(&config)?;
        assert_eq!(options.output_dir, PathBuf::from("/data/out"));
        assert_eq!(options.grouping, GroupingStrategy::Flat);
        assert!(!options.include_reasoning_in_output);
        assert_eq!(options.retry.max_retries, 5);
        assert_eq!(options.storage_root, Some(PathBuf::from("/data/storage")));
        assert!(!options.overwrite);

        Ok(())
    }
}
