pub mod cache;
pub mod cells;
pub mod config;
pub mod memory;
pub mod navigator;
pub mod provider;
pub mod residency;
pub mod service;

pub use cache::{AssetCache, CacheError};
pub use cells::{CellId, cells_around, cells_in_bounds};
pub use config::{ConfigError, ViewerConfig};
pub use memory::MemoryProvider;
pub use navigator::{NavigationError, Navigator};
pub use provider::*;
pub use residency::NodeState;
pub use service::{GraphService, ServiceError};
