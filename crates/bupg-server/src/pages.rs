//! Server-rendered pages for the storefront and the admin panel.

use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use bupg_store::Category;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::api::AppState;
use crate::auth::is_admin;
use crate::templates;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatQuery {
    product_id: Option<String>,
}

pub async fn home() -> Html<String> {
    Html(templates::home_page())
}

async fn category(state: &AppState, category: Category) -> Html<String> {
    let products = state.store.list_products(Some(category.as_str())).await;
    Html(templates::category_page(
        category,
        &products.records,
        products.is_degraded(),
    ))
}

pub async fn pubg(State(state): State<AppState>) -> Html<String> {
    category(&state, Category::Pubg).await
}

pub async fn free_fire(State(state): State<AppState>) -> Html<String> {
    category(&state, Category::FreeFire).await
}

pub async fn topup(State(state): State<AppState>) -> Html<String> {
    category(&state, Category::Topup).await
}

/// `/chat/new[?productId=]`
pub async fn new_chat(
    State(state): State<AppState>,
    Query(query): Query<NewChatQuery>,
) -> Html<String> {
    let products = state.store.list_products(None).await;
    Html(templates::new_chat_page(
        &products.records,
        query.product_id.as_deref(),
        products.is_degraded(),
    ))
}

/// `/chat/{id}`: the thread itself is fetched by the page.
pub async fn chat(Path(id): Path<String>) -> Html<String> {
    Html(templates::chat_page(&id))
}

pub async fn admin_login(cookies: Cookies) -> Response {
    if is_admin(&cookies) {
        return Redirect::to("/admin").into_response();
    }
    Html(templates::admin_login_page()).into_response()
}

pub async fn admin(cookies: Cookies) -> Response {
    if !is_admin(&cookies) {
        return Redirect::to("/admin/login").into_response();
    }
    Html(templates::admin_page()).into_response()
}
