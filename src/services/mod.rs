//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod message;
pub mod rsvp;
pub mod session;

// Re-exports per facilitare l'import
pub use message::{list_messages, post_message};
pub use rsvp::{accept_via_link, decline_via_link, respond_to_session};
pub use session::{create_session, delete_session, list_session_invites, list_sessions};

use axum::Json;
use serde_json::{Value, json};

/// Health check, senza autenticazione
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
