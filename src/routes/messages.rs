//! Contact message routes

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, PageRequest};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::messages::{
    Mailbox, MessageQuery, MessageStatus, ReplyMessageRequest, SendMessageRequest,
};
use crate::error::ApiError;

/// Query string for `GET /api/messages`
#[derive(Debug, Deserialize, Default)]
pub struct MessageListParams {
    #[serde(default, rename = "box")]
    pub mailbox: Mailbox,
    pub status: Option<MessageStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/messages
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Query(params): Query<MessageListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = MessageQuery {
        mailbox: params.mailbox,
        status: params.status,
    };
    let page = PageRequest {
        page: params.page,
        limit: params.limit,
    };

    let messages = state.messages.get_messages(auth.user_id, &query, page).await?;
    Ok(messages)
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.messages.send_message(auth.user_id, req).await?;
    Ok(Created(message))
}

/// PATCH /api/messages/:id/read
pub async fn mark_message_read(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state.messages.mark_as_read(auth.user_id, message_id).await?;
    Ok(DataResponse::new(message))
}

/// POST /api/messages/:id/reply
pub async fn reply_to_message(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Path(message_id): Path<Uuid>,
    Json(req): Json<ReplyMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reply = state
        .messages
        .reply_to_message(auth.user_id, message_id, req)
        .await?;
    Ok(Created(reply))
}
