//! Identity resolver e middleware di autenticazione / membership
//!
//! Ogni richiesta viene riverificata: nessuna cache, nessuno stato di sessione.

use crate::core::{AppError, AppState};
use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, Response, header},
    middleware::Next,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Audience dei token emessi dal servizio di autenticazione per gli utenti loggati
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// Identità verificata del chiamante, inserita nelle Extension della richiesta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Esito negativo della verifica di un token
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Token malformato, scaduto o rifiutato: il chiamante non è autenticato
    #[error("credential rejected: {0}")]
    Rejected(String),
    /// Il verifier non ha risposto: errore interno, non un problema del chiamante
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// Verifica esterna dei bearer token
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthUser, VerifyError>;
}

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
}

/// Verifica locale dei token HS256 firmati dal servizio di autenticazione
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    #[instrument(skip(self, token))]
    async fn verify(&self, token: &str) -> Result<AuthUser, VerifyError> {
        debug!("Decoding JWT token");
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| AuthUser {
                user_id: data.claims.sub,
                email: data.claims.email,
            })
            .map_err(|e| {
                warn!("Failed to decode JWT token: {:?}", e.kind());
                VerifyError::Rejected(e.to_string())
            })
    }
}

/// Risposta dell'endpoint di introspezione `/auth/v1/user`
#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    email: Option<String>,
}

/// Introspezione remota dei token presso il servizio di autenticazione
pub struct RemoteVerifier {
    client: Client,
    user_endpoint: String,
    api_key: String,
}

impl RemoteVerifier {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            user_endpoint: format!("{}/auth/v1/user", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for RemoteVerifier {
    #[instrument(skip(self, token))]
    async fn verify(&self, token: &str) -> Result<AuthUser, VerifyError> {
        let response = self
            .client
            .get(&self.user_endpoint)
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                error!("Auth introspection request failed: {e}");
                VerifyError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            let user: RemoteUser = response
                .json()
                .await
                .map_err(|e| VerifyError::Unavailable(format!("unexpected introspection body: {e}")))?;
            return Ok(AuthUser {
                user_id: user.id,
                email: user.email,
            });
        }

        if status.is_client_error() {
            // 401 / 403 / 422: il token non è valido
            warn!("Auth service rejected token with status {}", status);
            return Err(VerifyError::Rejected(format!("status {status}")));
        }

        error!("Auth service answered with status {}", status);
        Err(VerifyError::Unavailable(format!("status {status}")))
    }
}

/// Estrae il bearer token dall'header Authorization, se presente e ben formato
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

/// Risolve l'identità del chiamante.
///
/// # Returns
/// * `Ok(Some(user))` - Token presente e valido
/// * `Ok(None)` - Token assente, malformato o rifiutato: il chiamante non è autenticato
/// * `Err(AppError)` - Il verifier non è raggiungibile (500)
pub async fn resolve_identity(
    headers: &HeaderMap,
    verifier: &dyn IdentityVerifier,
) -> Result<Option<AuthUser>, AppError> {
    let Some(token) = bearer_token(headers) else {
        debug!("No bearer credential on request");
        return Ok(None);
    };

    match verifier.verify(token).await {
        Ok(user) => Ok(Some(user)),
        Err(VerifyError::Rejected(_)) => Ok(None),
        Err(err @ VerifyError::Unavailable(_)) => Err(err.into()),
    }
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let current_user = resolve_identity(req.headers(), state.verifier.as_ref())
        .await?
        .ok_or_else(|| {
            warn!("Missing or invalid bearer credential");
            AppError::unauthorized("Missing or invalid bearer token")
        })?;

    info!("User authenticated: {}", current_user.user_id);
    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}

/// Middleware che verifica che l'utente corrente sia membro del gruppo nel path.
/// Deve essere applicato dopo `authentication_middleware`.
#[instrument(skip(state, params, req, next))]
pub async fn group_membership_middleware(
    State(state): State<Arc<AppState>>,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running group membership middleware");
    // 1. Ottenere l'utente corrente dall'Extension (inserito dall'authentication_middleware)
    let current_user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| {
            warn!("User not found in request extensions");
            AppError::unauthorized("User not authenticated")
        })?
        .clone();

    // 2. Estrarre group_id dal path
    let group_id: i64 = params
        .get("group_id")
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| {
            warn!("Group ID not found in path: {}", req.uri().path());
            AppError::bad_request("Invalid group id")
        })?;

    // 3. Verificare la membership; un errore dello store non diventa mai "non membro"
    if !is_member(&state, group_id, current_user.user_id).await? {
        warn!("User {} is not a member of group {}", current_user.user_id, group_id);
        return Err(AppError::forbidden("You are not a member of this group"));
    }

    info!("User {} verified as member of group {}", current_user.user_id, group_id);
    Ok(next.run(req).await)
}

/// Group membership gate
pub async fn is_member(state: &AppState, group_id: i64, user_id: Uuid) -> Result<bool, AppError> {
    Ok(state.members.is_member(group_id, user_id).await?)
}
