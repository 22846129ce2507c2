//! Shared application state.
//!
//! Everything in here is built once at startup and only read afterwards.

use crate::config::ConfigV1;
use crate::dispatcher::Dispatcher;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Routes account operations to the configured platform.
    pub dispatcher: Arc<Dispatcher>,
}
