//! Chat threads and messages.
//!
//! Reading a single chat and posting customer messages need nothing but the
//! chat id; listing, admin replies and deletions need the admin cookie.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Response,
    Json,
};
use bupg_store::chats::NewChat;
use bupg_store::{Chat, Sender};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use tracing::debug;

use crate::api::{list_response, AppState};
use crate::auth::require_admin;
use crate::error::ServerError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    product_id: Option<String>,
    customer_name: Option<String>,
    whatsapp: Option<String>,
    text: Option<String>,
}

#[derive(Serialize)]
pub struct CreateChatResponse {
    id: String,
}

#[derive(Deserialize)]
pub struct PostMessageRequest {
    from: Option<Sender>,
    text: Option<String>,
}

/// Keep a field only if it has something besides whitespace.
fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// `GET /api/chats` (admin)
pub async fn list_chats(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Response, ServerError> {
    require_admin(&cookies)?;
    Ok(list_response(state.store.list_chats().await))
}

/// `POST /api/chats`
pub async fn create_chat(
    State(state): State<AppState>,
    payload: Result<Json<CreateChatRequest>, JsonRejection>,
) -> Result<Json<CreateChatResponse>, ServerError> {
    let Json(req) = payload?;

    let (Some(product_id), Some(customer_name), Some(text)) = (
        filled(req.product_id),
        filled(req.customer_name),
        filled(req.text),
    ) else {
        return Err(ServerError::MissingFields);
    };

    let chat = state
        .store
        .create_chat(NewChat {
            product_id,
            customer_name,
            whatsapp: filled(req.whatsapp),
            text,
        })
        .await?;

    Ok(Json(CreateChatResponse { id: chat.id }))
}

/// `GET /api/chats/{id}`
pub async fn get_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Chat>, ServerError> {
    Ok(Json(state.store.get_chat(&id).await?))
}

/// `POST /api/chats/{id}`: customers post freely, admins need the cookie.
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    cookies: Cookies,
    payload: Result<Json<PostMessageRequest>, JsonRejection>,
) -> Result<Json<Chat>, ServerError> {
    let Json(req) = payload?;

    let (Some(from), Some(text)) = (req.from, filled(req.text)) else {
        return Err(ServerError::MissingFields);
    };

    if from == Sender::Admin {
        require_admin(&cookies)?;
    }

    debug!(chat = %id, from = ?from, "Posting message");
    Ok(Json(state.store.append_message(&id, from, text).await?))
}

/// `DELETE /api/chats/{id}` (admin)
pub async fn delete_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    cookies: Cookies,
) -> Result<Json<serde_json::Value>, ServerError> {
    require_admin(&cookies)?;
    state.store.delete_chat(&id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `DELETE /api/chats/{id}/messages/{message_id}` (admin)
pub async fn delete_message(
    State(state): State<AppState>,
    Path((id, message_id)): Path<(String, String)>,
    cookies: Cookies,
) -> Result<Json<serde_json::Value>, ServerError> {
    require_admin(&cookies)?;
    state.store.delete_message(&id, &message_id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
