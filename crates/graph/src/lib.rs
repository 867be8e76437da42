pub mod calculator;
pub mod config;
pub mod edge;
pub mod edge_calculator;
pub mod error;
pub mod filter;
pub mod graph;
pub mod node;
pub mod sequence;
pub mod spatial;

pub use calculator::{rotation_from_compass, spatial_area_bounds};
pub use config::GraphConfig;
pub use edge::*;
pub use edge_calculator::{
    EdgeCalculator, EdgeCalculatorCoefficients, EdgeCalculatorDirections, EdgeCalculatorSettings,
    PotentialEdge,
};
pub use error::GraphError;
pub use filter::{FilterError, FilterExpr, FilterValue, NodeFilter};
pub use graph::Graph;
pub use node::{Node, NodeId, SpatialData};
pub use sequence::Sequence;
