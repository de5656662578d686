pub mod bounds;
pub mod dms;
pub mod geo;
pub mod ids;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use geo::*;
pub use ids::*;
