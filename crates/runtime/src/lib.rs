pub mod cancel;
pub mod event_bus;

pub use cancel::*;
pub use event_bus::*;
