pub mod contracts;
pub mod dataset;
pub mod mesh;

pub use contracts::*;
pub use dataset::*;
pub use mesh::*;
