pub mod bounds;
pub mod geo;
pub mod math;
pub mod spatial;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use geo::*;
pub use time::*;
