//! Storage backends.
//!
//! A [`Backend`] stores one JSON document per [`CollectionKey`]. Which
//! implementation is used is decided once at startup by [`select_backend`]:
//!
//! 1. Upstash Redis, when its REST URL and token are both set
//! 2. Vercel KV, when its REST URL and token are both set
//! 3. nothing, when running hosted (`VERCEL`) without either store: reads
//!    and writes fail with [`StoreError::Unconfigured`]
//! 4. local JSON files under the data directory

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::{Result, StoreError};

mod kv;
mod local;

pub use kv::{KvProvider, RestKvBackend};
pub use local::LocalFileBackend;

/// The two collections the storefront persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Products,
    Chats,
}

impl CollectionKey {
    /// File name used by the local backend.
    pub fn file_name(&self) -> &'static str {
        match self {
            CollectionKey::Products => "products.json",
            CollectionKey::Chats => "chats.json",
        }
    }

    /// Key used by the key-value backends.
    pub fn kv_key(&self) -> &'static str {
        match self {
            CollectionKey::Products => "bupg:products",
            CollectionKey::Chats => "bupg:chats",
        }
    }
}

/// Whole-document storage for a collection.
///
/// `load` returns `Ok(None)` when nothing has been stored yet, which callers
/// treat as an empty collection. Any `Err` means the backend could not
/// answer.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short name for logs and the health endpoint.
    fn describe(&self) -> &'static str;

    async fn load(&self, key: CollectionKey) -> Result<Option<String>>;

    async fn save(&self, key: CollectionKey, json: String) -> Result<()>;
}

/// URL + bearer token of a Redis-over-REST endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestCredentials {
    pub url: String,
    pub token: String,
}

impl RestCredentials {
    /// Both halves must be present and non-empty.
    pub fn from_parts(url: Option<String>, token: Option<String>) -> Option<Self> {
        match (url, token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => {
                Some(Self { url, token })
            }
            _ => None,
        }
    }
}

/// Inputs to backend selection.
#[derive(Debug, Clone, Default)]
pub struct StorageSettings {
    /// Directory holding `products.json` / `chats.json`.
    pub data_dir: PathBuf,
    pub upstash: Option<RestCredentials>,
    pub vercel_kv: Option<RestCredentials>,
    /// Running on managed hosting where the local filesystem is not durable.
    pub hosted: bool,
}

/// Pick the backend for these settings.
pub fn select_backend(settings: &StorageSettings) -> Result<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = if let Some(creds) = &settings.upstash {
        Arc::new(RestKvBackend::new(KvProvider::UpstashRedis, creds.clone())?)
    } else if let Some(creds) = &settings.vercel_kv {
        Arc::new(RestKvBackend::new(KvProvider::VercelKv, creds.clone())?)
    } else if settings.hosted {
        Arc::new(UnconfiguredBackend)
    } else {
        Arc::new(LocalFileBackend::new(settings.data_dir.clone()))
    };

    info!(backend = backend.describe(), "Storage backend selected");
    Ok(backend)
}

/// Hosted deployment with no key-value store: nothing can be persisted.
#[derive(Debug, Clone, Copy)]
pub struct UnconfiguredBackend;

const UNCONFIGURED_HINT: &str =
    "set UPSTASH_REDIS_REST_URL/UPSTASH_REDIS_REST_TOKEN or KV_REST_API_URL/KV_REST_API_TOKEN";

#[async_trait]
impl Backend for UnconfiguredBackend {
    fn describe(&self) -> &'static str {
        "unconfigured"
    }

    async fn load(&self, _key: CollectionKey) -> Result<Option<String>> {
        Err(StoreError::Unconfigured(UNCONFIGURED_HINT.to_string()))
    }

    async fn save(&self, _key: CollectionKey, _json: String) -> Result<()> {
        Err(StoreError::Unconfigured(UNCONFIGURED_HINT.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(name: &str) -> Option<RestCredentials> {
        Some(RestCredentials {
            url: format!("https://{name}.example.com"),
            token: format!("{name}-token"),
        })
    }

    #[test]
    fn test_credentials_need_both_parts() {
        assert!(RestCredentials::from_parts(Some("https://x".into()), None).is_none());
        assert!(RestCredentials::from_parts(Some("https://x".into()), Some(String::new())).is_none());
        assert!(RestCredentials::from_parts(Some("https://x".into()), Some("t".into())).is_some());
    }

    #[test]
    fn test_upstash_wins_over_vercel_kv() {
        let settings = StorageSettings {
            upstash: creds("upstash"),
            vercel_kv: creds("kv"),
            hosted: true,
            ..Default::default()
        };
        assert_eq!(select_backend(&settings).unwrap().describe(), "upstash-redis");
    }

    #[test]
    fn test_vercel_kv_when_no_upstash() {
        let settings = StorageSettings {
            vercel_kv: creds("kv"),
            ..Default::default()
        };
        assert_eq!(select_backend(&settings).unwrap().describe(), "vercel-kv");
    }

    #[test]
    fn test_hosted_without_store_is_unconfigured() {
        let settings = StorageSettings {
            hosted: true,
            ..Default::default()
        };
        assert_eq!(select_backend(&settings).unwrap().describe(), "unconfigured");
    }

    #[test]
    fn test_local_by_default() {
        let settings = StorageSettings {
            data_dir: PathBuf::from("./data"),
            ..Default::default()
        };
        assert_eq!(select_backend(&settings).unwrap().describe(), "local-file");
    }

    #[tokio::test]
    async fn test_unconfigured_fails_both_ways() {
        let backend = UnconfiguredBackend;
        assert!(matches!(
            backend.load(CollectionKey::Chats).await,
            Err(StoreError::Unconfigured(_))
        ));
        assert!(matches!(
            backend.save(CollectionKey::Chats, "[]".into()).await,
            Err(StoreError::Unconfigured(_))
        ));
    }
}
