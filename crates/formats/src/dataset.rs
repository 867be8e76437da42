use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::contracts::{ImageContract, SequenceContract};
use crate::mesh::MeshData;

/// Offline image collection: full image records, sequences and optional
/// per-image meshes keyed by image id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub images: Vec<ImageContract>,
    pub sequences: Vec<SequenceContract>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meshes: BTreeMap<String, MeshData>,
}

#[derive(Debug)]
pub enum DatasetError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        source: serde_json::Error,
    },
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io { path, source } => {
                write!(f, "failed to read dataset {}: {source}", path.display())
            }
            DatasetError::Parse { source } => write!(f, "failed to parse dataset: {source}"),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io { source, .. } => Some(source),
            DatasetError::Parse { source } => Some(source),
        }
    }
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let payload = fs::read_to_string(path).map_err(|e| DatasetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&payload)
    }

    pub fn from_json_str(payload: &str) -> Result<Self, DatasetError> {
        serde_json::from_str(payload).map_err(|e| DatasetError::Parse { source: e })
    }

    pub fn image(&self, id: &str) -> Option<&ImageContract> {
        self.images.iter().find(|image| image.id == id)
    }

    pub fn sequence(&self, id: &str) -> Option<&SequenceContract> {
        self.sequences.iter().find(|sequence| sequence.id == id)
    }
}
