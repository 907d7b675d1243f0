//! RSVP services - Accettazione e rifiuto degli inviti
//!
//! Il percorso autenticato (`respond`) e quello dei link nelle email passano entrambi
//! da `apply_rsvp`: stesso controllo dei conflitti, stesso avviso al creatore.

use crate::core::{AppError, AppState, AuthUser};
use crate::dtos::{MessageResponse, RespondRequestDTO};
use crate::entities::{Invite, InviteStatus, Session};
use crate::repositories::StoreError;
use crate::scheduling::fanout::profile_or_placeholder;
use crate::scheduling::{ConflictDetector, conflict_alert};
use crate::services::session::load_group_session;
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Registra la risposta dell'utente. Un accept che creerebbe un doppio booking viene
/// rifiutato con 409 e il creatore della sessione riceve un avviso.
pub(crate) async fn apply_rsvp(
    state: &AppState,
    session: &Session,
    user_id: Uuid,
    status: InviteStatus,
) -> Result<Invite, AppError> {
    if status == InviteStatus::Accepted {
        let detector = ConflictDetector::new(state.sessions.as_ref());
        if detector
            .has_conflict_excluding(user_id, session.start_at, session.id)
            .await?
        {
            warn!("User {} already accepted a session at {}", user_id, session.start_at);
            alert_creator(state, session, user_id).await;
            return Err(StoreError::SlotTaken.into());
        }
    }

    match state.sessions.upsert_invite(session.id, user_id, status).await {
        Ok(invite) => Ok(invite),
        Err(StoreError::SlotTaken) => {
            // un accept concorrente ha occupato lo slot tra controllo e scrittura
            warn!("Slot taken concurrently for user {}", user_id);
            alert_creator(state, session, user_id).await;
            Err(StoreError::SlotTaken.into())
        }
        Err(err) => Err(err.into()),
    }
}

/// Avviso al creatore che `user_id` ha già una sessione accettata allo stesso istante
async fn alert_creator(state: &AppState, session: &Session, user_id: Uuid) {
    let profiles: HashMap<Uuid, _> = match state
        .profiles
        .find_many(&[session.creator_id, user_id])
        .await
    {
        Ok(found) => found.into_iter().map(|p| (p.id, p)).collect(),
        Err(err) => {
            error!("Profiles lookup failed, conflict alert not sent: {}", err);
            return;
        }
    };

    let creator = profile_or_placeholder(&profiles, session.creator_id);
    let member = profile_or_placeholder(&profiles, user_id);
    if let Some(alert) = conflict_alert(session, &creator, &member) {
        state.notifications.spawn(vec![alert]);
    }
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn respond_to_session(
    State(state): State<Arc<AppState>>,
    Path((group_id, session_id)): Path<(i64, i64)>,
    Extension(current_user): Extension<AuthUser>,
    Json(body): Json<RespondRequestDTO>,
) -> Result<Json<MessageResponse>, AppError> {
    debug!("Responding to session {}", session_id);
    // 1. Autenticazione e membership sono già verificate dai middleware
    // 2. status deve essere "accepted" o "declined"
    // 3. Caricare la sessione (404 se assente o di un altro gruppo)
    // 4. Controllo conflitti (solo per accepted) e upsert dell'invito
    let status = body.response_status().ok_or_else(|| {
        warn!("Invalid RSVP status: {:?}", body.status);
        AppError::bad_request("status must be 'accepted' or 'declined'")
    })?;

    let session = load_group_session(&state, group_id, session_id).await?;
    let invite = apply_rsvp(&state, &session, current_user.user_id, status).await?;

    info!("Invite for session {} is now {}", session_id, invite.status);
    Ok(Json(MessageResponse::new(format!("Session {}", invite.status))))
}

/// Link "accetta" delle email: nessun bearer token, risposta in testo semplice
#[instrument(skip(state))]
pub async fn accept_via_link(
    State(state): State<Arc<AppState>>,
    Path((session_id, user_id)): Path<(i64, Uuid)>,
) -> (StatusCode, String) {
    respond_via_link(&state, session_id, user_id, InviteStatus::Accepted).await
}

/// Link "rifiuta" delle email
#[instrument(skip(state))]
pub async fn decline_via_link(
    State(state): State<Arc<AppState>>,
    Path((session_id, user_id)): Path<(i64, Uuid)>,
) -> (StatusCode, String) {
    respond_via_link(&state, session_id, user_id, InviteStatus::Declined).await
}

async fn respond_via_link(
    state: &AppState,
    session_id: i64,
    user_id: Uuid,
    status: InviteStatus,
) -> (StatusCode, String) {
    match load_and_apply(state, session_id, user_id, status).await {
        Ok(_) => {
            info!("Session {} {} via email link", session_id, status);
            (
                StatusCode::OK,
                format!(
                    "You have {} the study session. You can close this page.",
                    status
                ),
            )
        }
        Err(err) => (err.status(), err.message().to_string()),
    }
}

async fn load_and_apply(
    state: &AppState,
    session_id: i64,
    user_id: Uuid,
    status: InviteStatus,
) -> Result<Invite, AppError> {
    let session = state
        .sessions
        .get_session(session_id)
        .await?
        .ok_or_else(|| {
            warn!("Email link points to missing session {}", session_id);
            AppError::not_found("Session not found")
        })?;
    apply_rsvp(state, &session, user_id, status).await
}
