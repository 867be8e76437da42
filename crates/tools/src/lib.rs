use std::path::Path;
use std::sync::Arc;

use formats::{Dataset, DatasetError};
use foundation::geo::{LngLat, LngLatAlt};
use graph::{NavigationDirection, NavigationEdge};
use serde::Serialize;
use streaming::{
    ConfigError, GraphService, MemoryProvider, NavigationError, ServiceError, ViewerConfig,
};
use tracing::{debug, info};
use viewer::Viewer;

/// Frames after which a transition is reported as unsettled.
const MAX_FRAMES: u32 = 10_000;

#[derive(Debug)]
pub enum ToolError {
    Config(ConfigError),
    Dataset(DatasetError),
    Service(ServiceError),
    Navigation(NavigationError),
    UnknownDirection(String),
    Unsettled { key: String },
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Config(e) => write!(f, "{e}"),
            ToolError::Dataset(e) => write!(f, "{e}"),
            ToolError::Service(e) => write!(f, "{e}"),
            ToolError::Navigation(e) => write!(f, "{e}"),
            ToolError::UnknownDirection(s) => write!(f, "unknown direction: {s}"),
            ToolError::Unsettled { key } => {
                write!(f, "transition to {key} did not settle in {MAX_FRAMES} frames")
            }
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Config(e) => Some(e),
            ToolError::Dataset(e) => Some(e),
            ToolError::Service(e) => Some(e),
            ToolError::Navigation(e) => Some(e),
            ToolError::UnknownDirection(_) | ToolError::Unsettled { .. } => None,
        }
    }
}

impl From<ConfigError> for ToolError {
    fn from(e: ConfigError) -> Self {
        ToolError::Config(e)
    }
}

impl From<DatasetError> for ToolError {
    fn from(e: DatasetError) -> Self {
        ToolError::Dataset(e)
    }
}

impl From<ServiceError> for ToolError {
    fn from(e: ServiceError) -> Self {
        ToolError::Service(e)
    }
}

impl From<NavigationError> for ToolError {
    fn from(e: NavigationError) -> Self {
        ToolError::Navigation(e)
    }
}

pub fn parse_direction(s: &str) -> Result<NavigationDirection, ToolError> {
    NavigationDirection::parse(s).ok_or_else(|| ToolError::UnknownDirection(s.to_string()))
}

/// Build a service over a JSON dataset, with an optional JSON config.
pub fn load_service(dataset: &Path, config: Option<&Path>) -> Result<GraphService, ToolError> {
    let config = match config {
        Some(path) => ViewerConfig::from_path(path)?,
        None => ViewerConfig::default(),
    };
    let dataset = Dataset::load(dataset)?;
    info!(
        "loaded {} images in {} sequences",
        dataset.images.len(),
        dataset.sequences.len()
    );
    let provider = Arc::new(MemoryProvider::new(dataset, config.cell_zoom));
    Ok(GraphService::new(config, provider.clone(), provider))
}

/// All edges of `key`, computing them first when needed.
pub async fn edges(service: &GraphService, key: &str) -> Result<Vec<NavigationEdge>, ToolError> {
    service.cache_edges(key).await?;
    Ok(service
        .edges(key)
        .map(|edges| edges.iter().cloned().collect())
        .unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkStep {
    pub key: String,
    pub lng: f64,
    pub lat: f64,
    /// Frames rendered until the transition settled.
    pub frames: u32,
    /// Vertical field of view in degrees once settled.
    pub fov: f64,
}

/// Start at `start` and follow `direction` up to `steps` times, stopping
/// early where no edge continues.
pub async fn walk(
    viewer: &Viewer,
    start: &str,
    direction: NavigationDirection,
    steps: usize,
) -> Result<Vec<WalkStep>, ToolError> {
    let node = viewer.move_to_key(start).await?;
    let mut walked = vec![settle(viewer, node.key(), node.lng_lat())?];
    for _ in 0..steps {
        let node = match viewer.move_dir(direction).await {
            Ok(node) => node,
            Err(e) if e.is_not_found() => {
                debug!("walk stopped: {e}");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        walked.push(settle(viewer, node.key(), node.lng_lat())?);
    }
    Ok(walked)
}

/// Canvas pixel of `point` seen from `key` once the viewer has settled there.
pub async fn project(
    viewer: &Viewer,
    key: &str,
    point: LngLatAlt,
) -> Result<Option<[f64; 2]>, ToolError> {
    let node = viewer.move_to_key(key).await?;
    settle(viewer, node.key(), node.lng_lat())?;
    Ok(viewer.project(point))
}

fn settle(viewer: &Viewer, key: &str, lng_lat: LngLat) -> Result<WalkStep, ToolError> {
    let mut frames = 0;
    while viewer.tick() {
        frames += 1;
        if frames >= MAX_FRAMES {
            return Err(ToolError::Unsettled {
                key: key.to_string(),
            });
        }
    }
    Ok(WalkStep {
        key: key.to_string(),
        lng: lng_lat.lng,
        lat: lng_lat.lat,
        frames,
        fov: viewer.with_camera(|c| c.perspective().fov),
    })
}
