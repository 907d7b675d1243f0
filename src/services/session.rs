//! Session services - Creazione, lista e cancellazione delle sessioni di studio

use crate::core::{AppError, AppState, AuthUser};
use crate::dtos::{
    CreateSessionDTO, CreateSessionRequestDTO, InviteDTO, InviteListResponse, MessageResponse,
    SessionDTO, SessionListResponse, SessionResponse, parse_start_at,
};
use crate::entities::Session;
use crate::scheduling::InviteFanout;
use axum::{
    Extension,
    extract::{Json, Path, State},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Sessione del gruppo indicato nel path; 404 anche se la sessione esiste ma in un altro gruppo
pub(crate) async fn load_group_session(
    state: &AppState,
    group_id: i64,
    session_id: i64,
) -> Result<Session, AppError> {
    state
        .sessions
        .get_session(session_id)
        .await?
        .filter(|s| s.group_id == group_id)
        .ok_or_else(|| {
            warn!("Session {} not found in group {}", session_id, group_id);
            AppError::not_found("Session not found")
        })
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
    Extension(current_user): Extension<AuthUser>, // ottenuto dall'authentication_middleware
    Json(body): Json<CreateSessionRequestDTO>,
) -> Result<Json<SessionResponse>, AppError> {
    debug!("Creating session in group {}", group_id);
    // 1. Autenticazione e membership sono già verificate dai middleware
    // 2. Validare start_at (mancante / non interpretabile / non futuro) e gli altri campi
    // 3. Salvare la sessione: da qui in poi la risposta è sempre 200
    // 4. Elencare i membri del gruppo escluso il creatore; se non ce ne sono, fine
    // 5. Per ogni membro: controllo conflitti, invito pending oppure avviso al creatore
    // 6. Inviare le email in background, senza attenderne l'esito

    let start_at = parse_start_at(body.start_at.as_ref(), Utc::now()).map_err(|e| {
        warn!("Rejected start_at: {:?}", e);
        AppError::bad_request(e.message())
    })?;
    body.validate()?;

    let session = state
        .sessions
        .create_session(&CreateSessionDTO {
            group_id,
            creator_id: current_user.user_id,
            start_at,
            venue: body.venue,
            topic: body.topic,
            time_goal_minutes: body.time_goal_minutes,
            content_goal: body.content_goal,
        })
        .await?;
    info!("Session {} created for {}", session.id, session.start_at);

    let members: Vec<Uuid> = match state.members.list_member_ids(group_id).await {
        Ok(ids) => ids
            .into_iter()
            .filter(|id| *id != current_user.user_id)
            .collect(),
        Err(err) => {
            error!("Could not list members of group {}, no invites sent: {}", group_id, err);
            Vec::new()
        }
    };

    if members.is_empty() {
        debug!("No other members in group {}, skipping invites", group_id);
        return Ok(Json(SessionResponse::new(session.into())));
    }

    let batch = InviteFanout::new(
        state.sessions.as_ref(),
        state.profiles.as_ref(),
        &state.public_base_url,
    )
    .run(&session, &members)
    .await;

    if !batch.is_empty() {
        debug!("Dispatching {} notifications in background", batch.len());
        state.notifications.spawn(batch);
    }

    Ok(Json(SessionResponse::new(session.into())))
}

#[instrument(skip(state))]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions: Vec<SessionDTO> = state
        .sessions
        .list_sessions(group_id)
        .await?
        .into_iter()
        .map(SessionDTO::from)
        .collect();

    info!("Retrieved {} sessions for group {}", sessions.len(), group_id);
    Ok(Json(SessionListResponse { sessions }))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path((group_id, session_id)): Path<(i64, i64)>,
    Extension(current_user): Extension<AuthUser>,
) -> Result<Json<MessageResponse>, AppError> {
    // 1. Caricare la sessione (404 se assente o di un altro gruppo)
    // 2. Solo il creatore può cancellarla (403)
    // 3. Cancellare sessione e inviti
    let session = load_group_session(&state, group_id, session_id).await?;

    if session.creator_id != current_user.user_id {
        warn!("User is not the creator of session {}", session_id);
        return Err(AppError::forbidden(
            "Only the creator can delete this session",
        ));
    }

    state.sessions.delete_session(session_id).await?;

    info!("Session {} deleted", session_id);
    Ok(Json(MessageResponse::new("Session deleted")))
}

#[instrument(skip(state))]
pub async fn list_session_invites(
    State(state): State<Arc<AppState>>,
    Path((group_id, session_id)): Path<(i64, i64)>,
) -> Result<Json<InviteListResponse>, AppError> {
    let session = load_group_session(&state, group_id, session_id).await?;

    let invites: Vec<InviteDTO> = state
        .sessions
        .list_invites_for_session(session.id)
        .await?
        .into_iter()
        .map(InviteDTO::from)
        .collect();

    debug!("Session {} has {} invites", session_id, invites.len());
    Ok(Json(InviteListResponse { invites }))
}
