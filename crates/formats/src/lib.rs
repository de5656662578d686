pub mod error;
pub mod gps_table;
pub mod points_doc;

pub use error::*;
pub use gps_table::*;
pub use points_doc::*;
