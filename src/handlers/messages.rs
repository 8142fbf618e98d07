//! Messaging endpoints act on behalf of the signed-in caller.

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::models::NewMessage;
use crate::response::{success_count, success_many, success_one, success_one_ok};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct SendBody {
    pub recipient_id: Uuid,
    #[serde(default)]
    pub child_id: Option<Uuid>,
    pub content: String,
}

pub async fn inbox(State(state): State<AppState>, caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.messages().inbox(&caller.id()).await?))
}

pub async fn sent(State(state): State<AppState>, caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.messages().sent(&caller.id()).await?))
}

pub async fn unread_count(State(state): State<AppState>, caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_count(state.client.messages().unread_count(&caller.id()).await?))
}

pub async fn conversation(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(other): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(state.client.messages().conversation(&caller.id(), &other).await?))
}

pub async fn send(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, AppError> {
    let msg = state
        .client
        .messages()
        .send(&NewMessage {
            sender_id: caller.id(),
            recipient_id: body.recipient_id,
            child_id: body.child_id,
            content: body.content,
        })
        .await?;
    Ok(success_one(msg))
}

/// Only the recipient may mark a message read.
pub async fn mark_read(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let msg = state.client.messages().get(&id).await?;
    caller.require_self(&[msg.recipient_id])?;
    Ok(success_one_ok(state.client.messages().mark_read(&id).await?))
}

pub async fn mark_conversation_read(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(other): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let n = state.client.messages().mark_conversation_read(&caller.id(), &other).await?;
    Ok(success_count(n as u64))
}

/// Either party to a message may delete it.
pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let msg = state.client.messages().get(&id).await?;
    caller.require_self(&[msg.sender_id, msg.recipient_id])?;
    Ok(success_one_ok(state.client.messages().delete(&id).await?))
}
