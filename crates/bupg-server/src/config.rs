//! Server configuration loaded from environment variables.
//!
//! All settings have defaults so the storefront starts with zero
//! configuration for local development (local JSON files, local uploads,
//! admin password `1234`).

use std::net::SocketAddr;
use std::path::PathBuf;

use bupg_store::{RestCredentials, StorageSettings};

/// Admin password used when `ADMIN_PASSWORD` is not set.
pub const DEFAULT_ADMIN_PASSWORD: &str = "1234";
pub const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Env: `HTTP_ADDR`. Default: `0.0.0.0:3000`
    pub http_addr: SocketAddr,

    /// Directory holding `products.json` and `chats.json`.
    /// Env: `DATA_DIR`. Default: `./data`
    pub data_dir: PathBuf,

    /// Directory where uploads are written when blob storage is not
    /// configured; served under `/uploads`.
    /// Env: `UPLOAD_DIR`. Default: `./public/uploads`
    pub upload_dir: PathBuf,

    /// Request body limit for uploads.
    /// Env: `MAX_UPLOAD_BYTES`. Default: 10 MiB
    pub max_upload_bytes: usize,

    /// Env: `ADMIN_PASSWORD`. Default: [`DEFAULT_ADMIN_PASSWORD`]
    pub admin_password: String,

    /// Vercel Blob read-write token; enables blob uploads.
    /// Env: `BLOB_READ_WRITE_TOKEN`
    pub blob_token: Option<String>,

    /// Env: `VERCEL_BLOB_API_URL`. Default: [`DEFAULT_BLOB_API_URL`]
    pub blob_api_url: String,

    /// Env: `KV_REST_API_URL` + `KV_REST_API_TOKEN`
    pub vercel_kv: Option<RestCredentials>,

    /// Env: `UPSTASH_REDIS_REST_URL` + `UPSTASH_REDIS_REST_TOKEN`
    pub upstash: Option<RestCredentials>,

    /// Running on Vercel. Env: `VERCEL` (any non-empty value)
    pub hosted: bool,
}

impl std::fmt::Debug for ServerConfig {
    // Secrets stay out of logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("http_addr", &self.http_addr)
            .field("data_dir", &self.data_dir)
            .field("upload_dir", &self.upload_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("blob_enabled", &self.blob_token.is_some())
            .field("blob_api_url", &self.blob_api_url)
            .field("vercel_kv", &self.vercel_kv.as_ref().map(|c| &c.url))
            .field("upstash", &self.upstash.as_ref().map(|c| &c.url))
            .field("hosted", &self.hosted)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 3000).into(),
            data_dir: PathBuf::from("./data"),
            upload_dir: PathBuf::from("./public/uploads"),
            max_upload_bytes: 10 * 1024 * 1024, // 10 MiB
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            blob_token: None,
            blob_api_url: DEFAULT_BLOB_API_URL.to_string(),
            vercel_kv: None,
            upstash: None,
            hosted: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = var("DATA_DIR") {
            config.data_dir = PathBuf::from(path);
        }

        if let Some(path) = var("UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(path);
        }

        if let Some(val) = var("MAX_UPLOAD_BYTES") {
            match val.parse::<usize>() {
                Ok(n) => config.max_upload_bytes = n,
                Err(_) => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_BYTES, using default"),
            }
        }

        if let Some(password) = var("ADMIN_PASSWORD") {
            config.admin_password = password;
        }

        config.blob_token = var("BLOB_READ_WRITE_TOKEN");
        if let Some(url) = var("VERCEL_BLOB_API_URL") {
            config.blob_api_url = url;
        }

        config.vercel_kv =
            RestCredentials::from_parts(var("KV_REST_API_URL"), var("KV_REST_API_TOKEN"));
        config.upstash = RestCredentials::from_parts(
            var("UPSTASH_REDIS_REST_URL"),
            var("UPSTASH_REDIS_REST_TOKEN"),
        );
        config.hosted = var("VERCEL").is_some();

        config
    }

    pub fn uses_default_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }

    pub fn storage_settings(&self) -> StorageSettings {
        StorageSettings {
            data_dir: self.data_dir.clone(),
            upstash: self.upstash.clone(),
            vercel_kv: self.vercel_kv.clone(),
            hosted: self.hosted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> ServerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = from_map(&[]);
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 3000).into());
        assert!(config.uses_default_password());
        assert!(config.blob_token.is_none());
        assert!(!config.hosted);
    }

    #[test]
    fn test_reads_storage_env() {
        let config = from_map(&[
            ("UPSTASH_REDIS_REST_URL", "https://eu1.upstash.io"),
            ("UPSTASH_REDIS_REST_TOKEN", "tok"),
            ("KV_REST_API_URL", "https://kv.vercel.app"),
            ("VERCEL", "1"),
            ("DATA_DIR", "/srv/data"),
        ]);

        assert_eq!(config.upstash.as_ref().unwrap().token, "tok");
        // Token missing: Vercel KV is not configured.
        assert!(config.vercel_kv.is_none());
        let settings = config.storage_settings();
        assert!(settings.hosted);
        assert_eq!(settings.data_dir, PathBuf::from("/srv/data"));
    }

    #[test]
    fn test_invalid_and_empty_values_fall_back() {
        let config = from_map(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("ADMIN_PASSWORD", ""),
            ("MAX_UPLOAD_BYTES", "lots"),
            ("VERCEL", ""),
        ]);
        assert_eq!(config.http_addr, ServerConfig::default().http_addr);
        assert!(config.uses_default_password());
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(!config.hosted);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = from_map(&[
            ("ADMIN_PASSWORD", "hunter2"),
            ("BLOB_READ_WRITE_TOKEN", "vercel_blob_rw_store_secret"),
        ]);
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("secret"));
    }
}
