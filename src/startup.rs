//! Application startup and server initialization.
//!
//! Compiles the request schemas, builds the platform registry and the
//! dispatcher, then serves the router on the configured address.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ConfigV1;
use crate::dispatcher::Dispatcher;
use crate::platforms::PlatformRegistry;
use crate::routes;
use crate::schema::{SchemaError, SchemaRegistry};
use crate::state::AppState;

/// Build the shared state from the configuration.
///
/// # Errors
///
/// Returns an error if a schema file cannot be read, parsed or compiled.
pub fn build_state(config: Arc<ConfigV1>) -> Result<AppState, SchemaError> {
    let schemas = Arc::new(SchemaRegistry::load(&config.schemas)?);
    let platforms = PlatformRegistry::from_config(&config.platforms);

    if platforms.contains(&config.platform) {
        info!(
            "Dispatching to platform '{}' (registered: {})",
            config.platform,
            platforms.platform_ids().join(", ")
        );
    } else {
        warn!(
            "Platform '{}' is not registered (registered: {}); every request will fail",
            config.platform,
            platforms.platform_ids().join(", ")
        );
    }

    let dispatcher = Arc::new(Dispatcher::new(config.clone(), Arc::new(platforms), schemas));
    Ok(AppState { config, dispatcher })
}

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if the state cannot be built, the server fails to bind
/// to the configured address, or it stops with a runtime error.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config.clone())?;
    let app = routes::create_router(state);

    info!("Starting server on {}", config.bind_address);
    let listener = TcpListener::bind(&config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
