//! EmailApiNotifier - Invio tramite API email transazionale a template

use super::{Notification, NotificationKind, Notifier, NotifyError};
use crate::core::config::EmailApiConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a BTreeMap<String, String>,
}

pub struct EmailApiNotifier {
    client: Client,
    config: EmailApiConfig,
}

impl EmailApiNotifier {
    pub fn new(config: EmailApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self { client, config })
    }

    fn template_for(&self, kind: NotificationKind) -> &str {
        match kind {
            NotificationKind::Invitation => &self.config.invite_template_id,
            NotificationKind::ConflictAlert => &self.config.conflict_template_id,
        }
    }
}

/// L'API risponde con il testo "OK" oppure con un body json: entrambi valgono come successo
pub fn classify_response(status: u16, body: &str) -> Result<(), NotifyError> {
    if !(200..300).contains(&status) {
        return Err(NotifyError::Status {
            status,
            body: body.trim().to_string(),
        });
    }

    let trimmed = body.trim();
    if trimmed == "OK" || serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return Ok(());
    }

    Err(NotifyError::UnexpectedBody(trimmed.to_string()))
}

#[async_trait]
impl Notifier for EmailApiNotifier {
    #[instrument(skip(self, notification), fields(kind = ?notification.kind))]
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut params = notification.params.clone();
        params
            .entry("to_email".to_string())
            .or_insert_with(|| notification.recipient_email.clone());

        let request = SendRequest {
            service_id: &self.config.service_id,
            template_id: self.template_for(notification.kind),
            user_id: &self.config.account_id,
            access_token: self.config.access_token.as_deref(),
            template_params: &params,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        debug!("Email api answered {}", status);
        classify_response(status, &body)
    }
}
