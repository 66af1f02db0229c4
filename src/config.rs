// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::info;

use crate::ingest::SourceFormat;
use crate::model::Dataset;
use crate::query::{SortSpec, DEFAULT_SORT};

/// Looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.yaml";

pub const DEFAULT_PUBLISHER_PATH: &str = "out-recordedby_publisher/0052593-251009101135966.csv";
pub const DEFAULT_HOSTING_PATH: &str =
    "out-recordedby_hostingorg/0051475-251009101135966-enriched.csv";

pub const GBIF_API_BASE: &str = "https://api.gbif.org/v1";

/// Where one dataset lives and how its file is delimited.
/// Unset `delimiter`/`quoting` fall back to the dataset's usual format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub path: String,
    pub delimiter: Option<char>,
    pub quoting: Option<bool>,
}

impl SourceConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn format(&self, dataset: Dataset) -> Result<SourceFormat> {
        let mut format = SourceFormat::for_dataset(dataset);
        if let Some(d) = self.delimiter {
            if !d.is_ascii() {
                bail!("{} delimiter {:?} must be a single ASCII character", dataset, d);
            }
            format.delimiter = d as u8;
        }
        if let Some(q) = self.quoting {
            format.quoting = q;
        }
        Ok(format)
    }
}

/// GBIF registry access used by the enrichment tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub concurrency: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: GBIF_API_BASE.to_string(),
            timeout_secs: 20,
            concurrency: 8,
        }
    }
}

impl RegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory or http(s) URL the source paths are relative to.
    pub base: String,
    pub publisher: SourceConfig,
    pub hosting: SourceConfig,
    /// Tab shown at startup.
    pub dataset: Dataset,
    /// Initial `"<column>-<asc|desc>"` sort.
    pub sort: String,
    pub registry: RegistryConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base: ".".to_string(),
            publisher: SourceConfig::new(DEFAULT_PUBLISHER_PATH),
            hosting: SourceConfig::new(DEFAULT_HOSTING_PATH),
            dataset: Dataset::Publisher,
            sort: DEFAULT_SORT.to_string(),
            registry: RegistryConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load `path`, or `dashboard.yaml` from the working directory if it
    /// exists, or the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            info!("no {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_yaml(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for dataset in Dataset::ALL {
            let source = self.source(dataset);
            if source.path.trim().is_empty() {
                bail!("no path configured for the {} dataset", dataset);
            }
            source.format(dataset)?;
        }
        if self.registry.concurrency == 0 {
            bail!("registry.concurrency must be at least 1");
        }
        Ok(())
    }

    pub fn source(&self, dataset: Dataset) -> &SourceConfig {
        match dataset {
            Dataset::Publisher => &self.publisher,
            Dataset::Hosting => &self.hosting,
        }
    }

    pub fn source_mut(&mut self, dataset: Dataset) -> &mut SourceConfig {
        match dataset {
            Dataset::Publisher => &mut self.publisher,
            Dataset::Hosting => &mut self.hosting,
        }
    }

    pub fn initial_sort(&self) -> SortSpec {
        self.sort.parse().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let config = DashboardConfig::from_yaml(
            r#"
base: "https://example.org/data/"
hosting:
  path: hosting.tsv
  delimiter: "\t"
sort: total_records-asc
"#,
        )?;
        assert_eq!(config.base, "https://example.org/data/");
        assert_eq!(config.publisher.path, DEFAULT_PUBLISHER_PATH);
        assert_eq!(config.hosting.path, "hosting.tsv");
        assert_eq!(config.hosting.format(Dataset::Hosting)?.delimiter, b'\t');
        assert!(config.hosting.format(Dataset::Hosting)?.quoting);
        assert_eq!(config.initial_sort().key, "total_records");
        assert_eq!(config.registry, RegistryConfig::default());
        Ok(())
    }

    #[test]
    fn rejects_empty_path_and_wide_delimiter() {
        assert!(DashboardConfig::from_yaml("publisher:\n  path: ''\n").is_err());
        assert!(DashboardConfig::from_yaml("hosting:\n  path: x\n  delimiter: 'é'\n").is_err());
    }

    #[test]
    fn defaults_match_source_formats() -> Result<()> {
        let config = DashboardConfig::default();
        let publisher = config.source(Dataset::Publisher).format(Dataset::Publisher)?;
        assert_eq!(publisher.delimiter, b'\t');
        assert!(!publisher.quoting);
        let hosting = config.source(Dataset::Hosting).format(Dataset::Hosting)?;
        assert_eq!(hosting.delimiter, b',');
        assert!(hosting.quoting);
        Ok(())
    }

    #[test]
    fn load_reads_explicit_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "dataset: hosting")?;
        let config = DashboardConfig::load(Some(tmp.path()))?;
        assert_eq!(config.dataset, Dataset::Hosting);
        Ok(())
    }

    #[test]
    fn load_fails_for_missing_explicit_file() {
        assert!(DashboardConfig::load(Some(Path::new("/nonexistent/dashboard.yaml"))).is_err());
    }
}
