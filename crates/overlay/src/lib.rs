//! Georeferencing of a raster image overlay: placement state, pixel/geo
//! transforms, id-based point matching and the center/scale fit.

pub mod config;
pub mod controller;
pub mod error;
pub mod markers;
pub mod matcher;
pub mod optimizer;
pub mod placement;
pub mod state;
pub mod transform;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use markers::*;
pub use matcher::*;
pub use optimizer::*;
pub use placement::*;
pub use state::*;
pub use transform::*;
