//! Server library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod notifications;
pub mod repositories;
pub mod scheduling;
pub mod services;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, auth, config};

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Crea il router principale dell'applicazione, tutte le rotte sotto `/api`
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(services::health))
        .nest("/sessions", configure_link_routes())
        .nest("/groups", configure_group_routes(state.clone()));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Link accept/decline delle email: raggiungibili senza bearer token
fn configure_link_routes() -> Router<Arc<AppState>> {
    use services::*;

    Router::new()
        .route("/{session_id}/accept/{user_id}", get(accept_via_link))
        .route("/{session_id}/decline/{user_id}", get(decline_via_link))
}

/// Rotte di gruppo: autenticazione + membership
fn configure_group_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{authentication_middleware, group_membership_middleware};
    use services::*;

    Router::new()
        .route(
            "/{group_id}/sessions",
            get(list_sessions).post(create_session),
        )
        .route("/{group_id}/sessions/{session_id}", delete(delete_session))
        .route(
            "/{group_id}/sessions/{session_id}/respond",
            post(respond_to_session),
        )
        .route(
            "/{group_id}/sessions/{session_id}/invites",
            get(list_session_invites),
        )
        .route(
            "/{group_id}/messages",
            get(list_messages).post(post_message),
        )
        // l'ultimo layer aggiunto è il primo a essere eseguito
        .layer(middleware::from_fn_with_state(
            state.clone(),
            group_membership_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
