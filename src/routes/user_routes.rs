//! Account endpoint handlers.
//!
//! Handlers only extract the request pieces; everything else happens in the
//! dispatcher. `resetPassword` and `changePassword` are kept next to their
//! kebab-case forms for older clients.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::debug;

use crate::models::Envelope;
use crate::platforms::RequestContext;
use crate::state::AppState;
use crate::utils::http_helpers::parse_json_body;

/// Registers account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/resetPassword", post(reset_password))
        .route("/reset-password", post(reset_password))
        .route("/me", get(me).post(update))
        .route("/order-history", get(order_history))
        .route("/changePassword", post(change_password))
        .route("/change-password", post(change_password))
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// The `token` query parameter. A query string that does not deserialize
/// (duplicate `token`, bad encoding) counts as no token at all.
fn access_token(query: Option<Query<TokenQuery>>) -> Option<String> {
    match query {
        Some(Query(query)) => query.token,
        None => {
            debug!("Ignoring query string that could not be parsed");
            None
        }
    }
}

async fn create(State(state): State<AppState>, context: RequestContext, body: Bytes) -> Envelope {
    state.dispatcher.create(context, parse_json_body(&body)).await
}

async fn login(State(state): State<AppState>, context: RequestContext, body: Bytes) -> Envelope {
    state.dispatcher.login(context, parse_json_body(&body)).await
}

async fn refresh(State(state): State<AppState>, context: RequestContext, body: Bytes) -> Envelope {
    state.dispatcher.refresh(context, parse_json_body(&body)).await
}

async fn reset_password(
    State(state): State<AppState>,
    context: RequestContext,
    body: Bytes,
) -> Envelope {
    state
        .dispatcher
        .reset_password(context, parse_json_body(&body))
        .await
}

async fn me(
    State(state): State<AppState>,
    context: RequestContext,
    query: Option<Query<TokenQuery>>,
) -> Envelope {
    state.dispatcher.me(context, access_token(query)).await
}

async fn order_history(
    State(state): State<AppState>,
    context: RequestContext,
    query: Option<Query<TokenQuery>>,
) -> Envelope {
    state.dispatcher.order_history(context, access_token(query)).await
}

async fn update(
    State(state): State<AppState>,
    context: RequestContext,
    query: Option<Query<TokenQuery>>,
    body: Bytes,
) -> Envelope {
    state
        .dispatcher
        .update(context, access_token(query), parse_json_body(&body))
        .await
}

async fn change_password(
    State(state): State<AppState>,
    context: RequestContext,
    query: Option<Query<TokenQuery>>,
    body: Bytes,
) -> Envelope {
    state
        .dispatcher
        .change_password(context, access_token(query), parse_json_body(&body))
        .await
}
