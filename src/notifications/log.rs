//! LogNotifier - Nessun invio reale, le notifiche finiscono solo nei log

use super::{Notification, Notifier, NotifyError};
use async_trait::async_trait;
use tracing::info;

#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            kind = ?notification.kind,
            to = %notification.recipient_email,
            params = ?notification.params,
            "Email delivery disabled, notification logged"
        );
        Ok(())
    }
}
