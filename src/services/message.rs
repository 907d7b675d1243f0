//! Message services - Chat di gruppo

use crate::core::{AppError, AppState, AuthUser};
use crate::dtos::{
    CreateGroupMessageDTO, CreateGroupMessageRequestDTO, GroupMessageDTO,
    GroupMessageListResponse, GroupMessageResponse, MessagesQuery,
};
use crate::services::session::load_group_session;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
    Query(params): Query<MessagesQuery>,
) -> Result<Json<GroupMessageListResponse>, AppError> {
    if let Some(session_id) = params.session_id {
        load_group_session(&state, group_id, session_id).await?;
    }

    let limit = params.effective_limit();
    debug!("Listing up to {} messages", limit);

    let messages: Vec<GroupMessageDTO> = state
        .messages
        .list_recent_messages(group_id, params.session_id, limit)
        .await?
        .into_iter()
        .map(GroupMessageDTO::from)
        .collect();

    info!("Retrieved {} messages for group {}", messages.len(), group_id);
    Ok(Json(GroupMessageListResponse { messages }))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i64>,
    Extension(current_user): Extension<AuthUser>,
    Json(body): Json<CreateGroupMessageRequestDTO>,
) -> Result<Json<GroupMessageResponse>, AppError> {
    // 1. Campi vuoti trattati come assenti, poi almeno uno tra content e attachment_url
    // 2. Validazione lunghezza e url
    // 3. La sessione referenziata deve appartenere al gruppo
    let body = body.normalized();
    if body.is_empty() {
        warn!("Empty message rejected");
        return Err(AppError::bad_request(
            "Message must have content or an attachment",
        ));
    }
    body.validate()?;

    if let Some(session_id) = body.session_id {
        load_group_session(&state, group_id, session_id).await?;
    }

    let message = state
        .messages
        .create_message(&CreateGroupMessageDTO {
            group_id,
            session_id: body.session_id,
            sender_id: current_user.user_id,
            content: body.content,
            attachment_url: body.attachment_url,
        })
        .await?;

    info!("Message {} posted in group {}", message.id, group_id);
    Ok(Json(GroupMessageResponse {
        message: message.into(),
    }))
}
