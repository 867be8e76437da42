use std::fs;
use std::path::{Path, PathBuf};

use graph::GraphConfig;
use serde::{Deserialize, Serialize};

/// Configuration for graph loading and asset residency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Edge calculation and spatial area settings.
    pub graph: GraphConfig,

    /// Cached nodes outside the trajectory kept before eviction starts.
    pub max_unused_nodes: usize,

    /// Web-mercator zoom of the cells core images are requested by.
    pub cell_zoom: u8,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            max_unused_nodes: 30,
            cell_zoom: 17,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        source: serde_json::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { source } => write!(f, "failed to parse config: {source}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source } => Some(source),
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(payload).map_err(|e| ConfigError::Parse { source: e })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&payload)
    }
}
