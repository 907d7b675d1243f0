//! Notifications module - Notification dispatcher
//!
//! Le notifiche sono best-effort: al massimo un tentativo per destinatario e per evento,
//! nessuna coda di retry. Il fallimento di un destinatario non interrompe gli altri e non
//! cambia mai la risposta HTTP che ha generato l'evento.

pub mod email;
pub mod log;
pub mod recording;

pub use email::EmailApiNotifier;
pub use log::LogNotifier;
pub use recording::RecordingNotifier;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Inviata a ogni membro (escluso il creatore) senza conflitti, con i link accept/decline
    Invitation,
    /// Inviata al creatore quando un membro ha già una sessione accettata allo stesso istante
    ConflictAlert,
}

/// Una singola email da inviare, con i parametri piatti del template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient_email: String,
    pub params: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(kind: NotificationKind, recipient_email: impl Into<String>) -> Self {
        Self {
            kind,
            recipient_email: recipient_email.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("email api request failed: {0}")]
    Transport(String),
    #[error("email api answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected email api response: {0}")]
    UnexpectedBody(String),
}

/// Esito di un invio, nella forma `{success, error?}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), NotifyError>> for DeliveryOutcome {
    fn from(value: Result<(), NotifyError>) -> Self {
        match value {
            Ok(()) => Self {
                success: true,
                error: None,
            },
            Err(err) => Self {
                success: false,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Canale di consegna delle notifiche
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Invia le notifiche di un evento in background, distanziate di `interval`
/// per rispettare i rate limit dell'API esterna
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, interval: Duration) -> Self {
        Self { notifier, interval }
    }

    /// Invio singolo, l'errore viene riportato nell'esito e loggato
    #[instrument(skip(self, notification), fields(kind = ?notification.kind, to = %notification.recipient_email))]
    pub async fn notify(&self, notification: &Notification) -> DeliveryOutcome {
        let outcome = DeliveryOutcome::from(self.notifier.notify(notification).await);
        match &outcome.error {
            None => info!("Notification delivered"),
            Some(err) => error!("Notification delivery failed: {err}"),
        }
        outcome
    }

    /// Invia in sequenza tutte le notifiche del batch
    pub async fn dispatch_all(&self, batch: Vec<Notification>) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(batch.len());
        for (i, notification) in batch.iter().enumerate() {
            if i > 0 && !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
            outcomes.push(self.notify(notification).await);
        }

        let failed = outcomes.iter().filter(|o| !o.success).count();
        debug!("Dispatched {} notifications, {} failed", outcomes.len(), failed);
        outcomes
    }

    /// Fire and forget: il chiamante non attende la consegna
    pub fn spawn(&self, batch: Vec<Notification>) -> JoinHandle<Vec<DeliveryOutcome>> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.dispatch_all(batch).await })
    }
}
