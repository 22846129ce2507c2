pub mod context;
pub mod plain_platform;
pub mod platforms;
pub mod rest_platform;

// Re-export from platforms.rs so we can do "use crate::platforms::*;"
pub use context::RequestContext;
pub use platforms::*;
