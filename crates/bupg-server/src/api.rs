use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use bupg_store::{Snapshot, Store};
use serde::Serialize;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::blob_store::{UploadStore, LOCAL_URL_PREFIX};
use crate::config::ServerConfig;
use crate::{auth, chats, pages, products, upload};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub uploads: Arc<UploadStore>,
    pub config: Arc<ServerConfig>,
}

/// Set to `degraded` on list responses read from an unreadable collection,
/// so "nothing stored" and "storage failing" are distinguishable.
pub const STORAGE_STATUS_HEADER: &str = "x-storage-status";

const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="640" height="400" viewBox="0 0 640 400"><rect width="640" height="400" fill="#1e1b4b"/><text x="320" y="210" fill="#a5b4fc" font-family="sans-serif" font-size="36" text-anchor="middle">BUPG</text></svg>"##;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(STORAGE_STATUS_HEADER)]);

    let mut router = Router::new()
        // JSON API
        .route("/health", get(health_check))
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/chats", get(chats::list_chats).post(chats::create_chat))
        .route(
            "/api/chats/{id}",
            get(chats::get_chat)
                .post(chats::post_message)
                .delete(chats::delete_chat),
        )
        .route(
            "/api/chats/{id}/messages/{message_id}",
            delete(chats::delete_message),
        )
        .route("/api/upload", post(upload::upload))
        .route("/api/admin/login", post(auth::login))
        .route("/api/admin/logout", post(auth::logout))
        // Pages
        .route("/", get(pages::home))
        .route("/pubg", get(pages::pubg))
        .route("/free-fire", get(pages::free_fire))
        .route("/topup", get(pages::topup))
        .route("/chat/new", get(pages::new_chat))
        .route("/chat/{id}", get(pages::chat))
        .route("/admin/login", get(pages::admin_login))
        .route("/admin", get(pages::admin))
        .route("/uploads/placeholder.svg", get(placeholder_image));

    if let UploadStore::Local(local) = state.uploads.as_ref() {
        router = router.nest_service(LOCAL_URL_PREFIX, ServeDir::new(local.base_path()));
    }

    router
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON list body, flagged with [`STORAGE_STATUS_HEADER`] when degraded.
pub fn list_response<T: Serialize>(snapshot: Snapshot<T>) -> Response {
    let degraded = snapshot.is_degraded();
    let mut response = Json(snapshot.records).into_response();
    if degraded {
        response.headers_mut().insert(
            HeaderName::from_static(STORAGE_STATUS_HEADER),
            HeaderValue::from_static("degraded"),
        );
    }
    response
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.store.backend_name(),
    })
}

async fn placeholder_image() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], PLACEHOLDER_SVG)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
