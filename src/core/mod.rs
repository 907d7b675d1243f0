//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Autenticazione (JWT o verifica remota) e membership di gruppo
//! - Configurazione
//! - Gestione errori
//! - Stato applicazione

pub mod auth;
pub mod config;
pub mod error;
pub mod state;

// Re-exports per facilitare l'import
pub use auth::{
    AuthUser, IdentityVerifier, JwtVerifier, RemoteVerifier, VerifyError,
    authentication_middleware, group_membership_middleware,
};
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
