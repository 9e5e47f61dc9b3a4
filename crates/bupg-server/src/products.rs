use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use bupg_store::products::{ProductDraft, ProductPatch};
use bupg_store::Product;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::api::{list_response, AppState};
use crate::auth::require_admin;
use crate::error::ServerError;

#[derive(Deserialize)]
pub struct ProductQuery {
    category: Option<String>,
}

/// `GET /api/products[?category=]`
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Response {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    list_response(state.store.list_products(category).await)
}

/// `POST /api/products` (admin)
pub async fn create_product(
    State(state): State<AppState>,
    cookies: Cookies,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ServerError> {
    require_admin(&cookies)?;
    let Json(draft) = payload?;

    let product = state.store.create_product(draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}` (admin)
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    cookies: Cookies,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<Product>, ServerError> {
    require_admin(&cookies)?;
    let Json(patch) = payload?;

    Ok(Json(state.store.update_product(&id, patch).await?))
}

/// `DELETE /api/products/{id}` (admin)
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    cookies: Cookies,
) -> Result<Json<serde_json::Value>, ServerError> {
    require_admin(&cookies)?;
    state.store.delete_product(&id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
