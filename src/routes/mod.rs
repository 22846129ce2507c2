//! HTTP route definitions and handlers.
//!
//! Account routes live under `/api/user`; the health check sits at the root.

mod health_routes;
mod user_routes;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/user", user_routes::routes())
        .merge(health_routes::routes())
        .with_state(state)
}
