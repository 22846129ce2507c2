// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod logging;
pub mod schemas;
pub mod secrets;
pub mod types;

pub use logging::*;
pub use schemas::*;
pub use secrets::*;
pub use types::*;
