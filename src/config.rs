//! Pipeline Configuration
//! JSON-backed settings with defaults for every field.

use crate::charts::ChartRequest;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "COLLEGE_METRICS_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "college_metrics.json";

const DPI_RANGE: std::ops::RangeInclusive<u32> = 20..=600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("dpi must be between 20 and 600, got {0}")]
    InvalidDpi(u32),
    #[error("{0} must not be empty")]
    EmptyPath(&'static str),
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub figures_dir: PathBuf,
    /// Optional JSON dump of the descriptive statistics.
    pub summary_path: Option<PathBuf>,
    pub render_charts: bool,
    pub dpi: u32,
    /// Explicit chart list; `None` renders the default catalogue.
    pub charts: Option<Vec<ChartRequest>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("datasets/dataset.csv"),
            output_path: PathBuf::from("datasets/engineered_data.csv"),
            figures_dir: PathBuf::from("figures"),
            summary_path: None,
            render_charts: true,
            dpi: 100,
            charts: None,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Config named by `COLLEGE_METRICS_CONFIG`, else `college_metrics.json`
    /// if it exists, else defaults.
    pub fn discover() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::discover_from(explicit, Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn discover_from(explicit: Option<PathBuf>, fallback: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if fallback.is_file() => Self::from_file(fallback),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !DPI_RANGE.contains(&self.dpi) {
            return Err(ConfigError::InvalidDpi(self.dpi));
        }
        for (name, path) in [
            ("input_path", &self.input_path),
            ("output_path", &self.output_path),
            ("figures_dir", &self.figures_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyPath(name));
            }
        }
        Ok(())
    }

    /// Charts to render for this run.
    pub fn chart_requests(&self) -> Vec<ChartRequest> {
        self.charts
            .clone()
            .unwrap_or_else(ChartRequest::default_catalog)
    }
}
