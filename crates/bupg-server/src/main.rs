//! # bupg-server
//!
//! Game-account storefront with a customer/admin chat channel.
//!
//! This binary provides:
//! - **Storefront pages** for the PUBG, Free Fire and top-up categories
//! - **Chat** between customers and the shop admin, polled by the browser
//! - **Admin panel** behind a shared password for product and chat management
//! - **Image uploads** to Vercel Blob, or to a local directory served under
//!   `/uploads`
//!
//! Products and chats are stored as JSON documents in Upstash Redis, Vercel
//! KV, or local files, depending on which credentials are configured.

mod api;
mod auth;
mod blob_store;
mod chats;
mod config;
mod error;
mod pages;
mod products;
mod templates;
mod upload;


use std::sync::Arc;

use bupg_store::Store;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::blob_store::{LocalUploads, UploadStore, VercelBlob};
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Environment and tracing (respects RUST_LOG)
    // -----------------------------------------------------------------------
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bupg_server=debug,bupg_store=debug")),
        )
        .init();

    info!("Starting bupg storefront v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    if config.uses_default_password() {
        warn!("ADMIN_PASSWORD is not set, using the default admin password");
    }

    // -----------------------------------------------------------------------
    // 3. Storage and uploads
    // -----------------------------------------------------------------------
    let store = Store::open(&config.storage_settings())?;

    let uploads = match &config.blob_token {
        Some(token) => {
            UploadStore::Blob(VercelBlob::new(token.clone(), config.blob_api_url.clone())?)
        }
        None => UploadStore::Local(LocalUploads::new(config.upload_dir.clone()).await?),
    };
    info!(
        storage = store.backend_name(),
        uploads = uploads.describe(),
        "Storage ready"
    );

    let http_addr = config.http_addr;
    let app_state = AppState {
        store,
        uploads: Arc::new(uploads),
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP server until it fails or Ctrl+C arrives
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
