use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::filter::FilterOptions;
use crate::data::loader::LoaderOptions;
use crate::data::model::DuplicatePolicy;

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Settings read from an optional TOML file; command-line flags override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Data file opened at start-up.
    pub input: Option<PathBuf>,
    /// Directory the exported PNGs are written to.
    pub out_dir: PathBuf,
    pub date_column: String,
    pub value_column: String,
    pub duplicates: DuplicatePolicy,
    pub lower_quantile: f64,
    pub upper_quantile: f64,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let loader = LoaderOptions::default();
        let filter = FilterOptions::default();
        Self {
            input: None,
            out_dir: PathBuf::from("."),
            date_column: loader.date_column,
            value_column: loader.value_column,
            duplicates: loader.duplicates,
            lower_quantile: filter.lower,
            upper_quantile: filter.upper,
            window_width: 1300.0,
            window_height: 620.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            date_column: self.date_column.clone(),
            value_column: self.value_column.clone(),
            duplicates: self.duplicates,
        }
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            lower: self.lower_quantile,
            upper: self.upper_quantile,
        }
    }
}
