//! RecordingNotifier - Registra le notifiche invece di inviarle (test)

use super::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct RecordingNotifier {
    attempts: Mutex<Vec<(Notification, bool)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ogni invio verso `email` fallirà
    pub async fn fail_for(&self, email: &str) {
        self.failing.lock().await.insert(email.to_string());
    }

    /// Notifiche consegnate con successo, in ordine di invio
    pub async fn delivered(&self) -> Vec<Notification> {
        self.attempts
            .lock()
            .await
            .iter()
            .filter(|(_, ok)| *ok)
            .map(|(n, _)| n.clone())
            .collect()
    }

    pub async fn attempt_count(&self) -> usize {
        self.attempts.lock().await.len()
    }

    /// Attende che siano stati fatti almeno `count` tentativi (il dispatch gira in background)
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.attempt_count().await >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let fail = self
            .failing
            .lock()
            .await
            .contains(&notification.recipient_email);
        self.attempts.lock().await.push((notification.clone(), !fail));

        if fail {
            return Err(NotifyError::Transport(format!(
                "simulated failure for {}",
                notification.recipient_email
            )));
        }
        Ok(())
    }
}
