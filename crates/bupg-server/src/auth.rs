//! Admin authentication.
//!
//! A single shared password unlocks the admin surface. A correct login sets
//! the `admin_auth=1` cookie (HttpOnly, SameSite=Lax, path `/`, no expiry);
//! every admin-gated handler re-checks it with [`require_admin`].

use axum::{extract::State, Json};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use tracing::{info, warn};

use crate::api::AppState;
use crate::error::ServerError;

pub const ADMIN_COOKIE: &str = "admin_auth";
const ADMIN_COOKIE_VALUE: &str = "1";

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    password: String,
}

pub fn is_admin(cookies: &Cookies) -> bool {
    cookies
        .get(ADMIN_COOKIE)
        .is_some_and(|c| c.value() == ADMIN_COOKIE_VALUE)
}

pub fn require_admin(cookies: &Cookies) -> Result<(), ServerError> {
    if is_admin(cookies) {
        Ok(())
    } else {
        Err(ServerError::Unauthorized)
    }
}

fn password_matches(given: &str, expected: &str) -> bool {
    let given = given.trim().as_bytes();
    let expected = expected.as_bytes();
    given.len() == expected.len() && given.ct_eq(expected).unwrap_u8() == 1
}

fn admin_cookie(value: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(ADMIN_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie
}

/// `POST /api/admin/login`
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    payload: Result<Json<LoginRequest>, axum::extract::rejection::JsonRejection>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let Json(req) = payload?;

    if !password_matches(&req.password, &state.config.admin_password) {
        warn!("Admin login rejected");
        return Err(ServerError::InvalidPassword);
    }

    cookies.add(admin_cookie(ADMIN_COOKIE_VALUE));
    info!("Admin logged in");
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `POST /api/admin/logout`
pub async fn logout(cookies: Cookies) -> Json<serde_json::Value> {
    cookies.remove(admin_cookie(""));
    Json(serde_json::json!({ "ok": true }))
}
