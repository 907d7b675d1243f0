//! Application State - Stato globale dell'applicazione
//!
//! Contiene gli store, il verificatore di identità e il dispatcher delle notifiche.
//! Tutto è dietro `Arc<dyn Trait>`: il backend PostgreSQL e quello in memoria
//! sono intercambiabili senza toccare handler e middleware.

use crate::core::auth::IdentityVerifier;
use crate::notifications::{NotificationDispatcher, Notifier};
use crate::repositories::{
    MembershipRepository, MembershipStore, MemoryStore, MessageRepository, MessageStore,
    ProfileRepository, ProfileStore, SessionRepository, SessionStore,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Sessioni e inviti (RSVP)
    pub sessions: Arc<dyn SessionStore>,

    /// Relazione gruppo-membro, in sola lettura
    pub members: Arc<dyn MembershipStore>,

    /// Profili, usati per indirizzare le email
    pub profiles: Arc<dyn ProfileStore>,

    /// Messaggi della chat di gruppo
    pub messages: Arc<dyn MessageStore>,

    /// Verifica dei bearer token
    pub verifier: Arc<dyn IdentityVerifier>,

    /// Invio in background di inviti e avvisi di conflitto
    pub notifications: NotificationDispatcher,

    /// Base dei link accept/decline inseriti negli inviti, senza slash finale
    pub public_base_url: String,
}

impl AppState {
    /// Crea lo stato con i repository PostgreSQL condividendo lo stesso pool
    ///
    /// # Arguments
    /// * `pool` - Pool di connessioni PostgreSQL
    /// * `verifier` - Verificatore dei token
    /// * `notifier` - Canale di consegna delle email
    /// * `dispatch_interval` - Attesa tra due email dello stesso evento
    /// * `public_base_url` - Base dei link inseriti negli inviti
    pub fn from_pool(
        pool: PgPool,
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn Notifier>,
        dispatch_interval: Duration,
        public_base_url: &str,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            members: Arc::new(MembershipRepository::new(pool.clone())),
            profiles: Arc::new(ProfileRepository::new(pool.clone())),
            messages: Arc::new(MessageRepository::new(pool)),
            verifier,
            notifications: NotificationDispatcher::new(notifier, dispatch_interval),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Crea lo stato sopra un unico `MemoryStore` che fa da backend per tutti i trait
    pub fn from_memory(
        store: Arc<MemoryStore>,
        verifier: Arc<dyn IdentityVerifier>,
        notifier: Arc<dyn Notifier>,
        dispatch_interval: Duration,
        public_base_url: &str,
    ) -> Self {
        Self {
            sessions: store.clone(),
            members: store.clone(),
            profiles: store.clone(),
            messages: store,
            verifier,
            notifications: NotificationDispatcher::new(notifier, dispatch_interval),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}
