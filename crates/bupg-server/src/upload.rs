//! `POST /api/upload` (admin).
//!
//! Two request shapes share the endpoint:
//! - `multipart/form-data` with a `file` field: the server stores the file
//!   and answers `{url}`;
//! - `application/json` `{type: "blob.generate-client-token", payload}`:
//!   with blob storage configured, the server hands out a client token so
//!   the browser can upload directly.

use axum::{
    extract::{FromRequest, Json, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use tracing::info;

use crate::api::AppState;
use crate::auth::require_admin;
use crate::blob_store::timestamped_name;
use crate::error::ServerError;

const GENERATE_CLIENT_TOKEN: &str = "blob.generate-client-token";

#[derive(Serialize)]
struct UploadResponse {
    url: String,
}

#[derive(Deserialize)]
struct ClientTokenRequest {
    #[serde(rename = "type")]
    kind: String,
    payload: ClientTokenPayload,
}

#[derive(Deserialize)]
struct ClientTokenPayload {
    pathname: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientTokenResponse {
    #[serde(rename = "type")]
    kind: &'static str,
    client_token: String,
}

pub async fn upload(
    State(state): State<AppState>,
    cookies: Cookies,
    request: Request,
) -> Result<Response, ServerError> {
    require_admin(&cookies)?;

    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if is_json {
        let Json(req) = Json::<ClientTokenRequest>::from_request(request, &state).await?;
        return client_token(&state, req).map(IntoResponse::into_response);
    }

    let mut multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        // A plain text part named `file` is not an upload.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            return Err(ServerError::MissingFile);
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;
        let size = data.len();

        let url = state
            .uploads
            .store(&file_name, content_type.as_deref(), data)
            .await?;

        info!(url = %url, size, store = state.uploads.describe(), "File uploaded");
        return Ok(Json(UploadResponse { url }).into_response());
    }

    Err(ServerError::MissingFile)
}

fn client_token(
    state: &AppState,
    req: ClientTokenRequest,
) -> Result<Json<ClientTokenResponse>, ServerError> {
    if req.kind != GENERATE_CLIENT_TOKEN {
        return Err(ServerError::BadRequest(format!(
            "Unsupported upload event: {}",
            req.kind
        )));
    }
    let Some(blob) = state.uploads.blob() else {
        return Err(ServerError::BadRequest(
            "Blob storage is not configured".to_string(),
        ));
    };

    let base_name = req
        .payload
        .pathname
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let pathname = format!("uploads/{}", timestamped_name(&base_name));
    let token = blob.client_token(&pathname, Utc::now().timestamp_millis())?;

    info!(pathname = %pathname, "Issued blob client token");
    Ok(Json(ClientTokenResponse {
        kind: GENERATE_CLIENT_TOKEN,
        client_token: token,
    }))
}
