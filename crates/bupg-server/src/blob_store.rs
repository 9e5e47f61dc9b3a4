//! Where uploaded product images end up.
//!
//! With `BLOB_READ_WRITE_TOKEN` set, files go to Vercel Blob and the
//! returned URL is the blob's public URL. Otherwise they are written to the
//! local upload directory and served under `/uploads/`.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{header, Client};
use serde::Deserialize;
use sha2::Sha256;
use tokio::fs;
use tracing::{debug, info};

use crate::error::ServerError;

/// URL prefix under which the local upload directory is served.
pub const LOCAL_URL_PREFIX: &str = "/uploads";
/// Folder inside the blob store that uploads are placed in.
const BLOB_FOLDER: &str = "uploads";
const BLOB_API_VERSION: &str = "7";
const CLIENT_TOKEN_TTL_MS: i64 = 60 * 60 * 1000;

/// Content types offered to direct client uploads. Advisory: the blob
/// service enforces it, this server never inspects file contents.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/svg+xml",
];

/// Replace everything outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "upload".to_string()
    } else {
        safe
    }
}

/// Sanitized name prefixed with the current unix time in milliseconds.
pub fn timestamped_name(name: &str) -> String {
    format!("{}_{}", Utc::now().timestamp_millis(), sanitize_file_name(name))
}

/// Verify that a resolved path stays within the expected base directory.
fn ensure_within(base: &Path, file_name: &str) -> Result<PathBuf, ServerError> {
    let mut resolved = base.to_path_buf();
    for component in Path::new(file_name).components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            _ => {
                return Err(ServerError::BadRequest(
                    "Path traversal detected".to_string(),
                ));
            }
        }
    }
    if resolved.parent() != Some(base) {
        return Err(ServerError::BadRequest(
            "Nested upload paths are not allowed".to_string(),
        ));
    }
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Local disk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LocalUploads {
    base_path: PathBuf,
}

impl LocalUploads {
    pub async fn new(base_path: PathBuf) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::Upload(format!(
                "Failed to create upload directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Local upload store initialized");
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn store(&self, file_name: &str, data: &[u8]) -> Result<String, ServerError> {
        let path = ensure_within(&self.base_path, file_name)?;
        fs::write(&path, data).await.map_err(|e| {
            ServerError::Upload(format!("Failed to write upload {}: {}", file_name, e))
        })?;

        debug!(file = file_name, size = data.len(), "Stored upload on disk");
        Ok(format!("{LOCAL_URL_PREFIX}/{file_name}"))
    }
}

// ---------------------------------------------------------------------------
// Vercel Blob
// ---------------------------------------------------------------------------

pub struct VercelBlob {
    token: String,
    api_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct PutBlobResponse {
    url: String,
}

type HmacSha256 = Hmac<Sha256>;

impl VercelBlob {
    pub fn new(token: String, api_url: String) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ServerError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            token,
            api_url,
            client,
        })
    }

    /// Store id embedded in a `vercel_blob_rw_<store>_<secret>` token.
    fn store_id(&self) -> Result<&str, ServerError> {
        self.token
            .split('_')
            .nth(3)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ServerError::Internal("Malformed BLOB_READ_WRITE_TOKEN".to_string()))
    }

    async fn put(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, ServerError> {
        let url = format!(
            "{}/{BLOB_FOLDER}/{file_name}",
            self.api_url.trim_end_matches('/')
        );
        let size = data.len();

        let mut request = self
            .client
            .put(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header("x-api-version", BLOB_API_VERSION)
            .header("x-add-random-suffix", "0")
            .body(data);
        if let Some(content_type) = content_type {
            request = request.header("x-content-type", content_type);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServerError::Upload(format!("Blob upload request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServerError::Upload(format!(
                "Blob upload failed: {status} - {body}"
            )));
        }

        let put: PutBlobResponse = response
            .json()
            .await
            .map_err(|e| ServerError::Upload(format!("Blob upload response: {e}")))?;

        debug!(file = file_name, size, url = %put.url, "Stored upload in blob storage");
        Ok(put.url)
    }

    /// Token letting a browser upload `pathname` straight to the blob store.
    ///
    /// `vercel_blob_client_<store>_` + base64(`hex(hmac) "." payload`), where
    /// payload is the base64 JSON of the upload constraints and the HMAC is
    /// SHA-256 keyed with the read-write token.
    pub fn client_token(&self, pathname: &str, now_ms: i64) -> Result<String, ServerError> {
        let store_id = self.store_id()?;
        let constraints = serde_json::json!({
            "pathname": pathname,
            "allowedContentTypes": ALLOWED_CONTENT_TYPES,
            "validUntil": now_ms + CLIENT_TOKEN_TTL_MS,
            "addRandomSuffix": false,
        });
        let payload = STANDARD.encode(constraints.to_string());

        let mut mac = HmacSha256::new_from_slice(self.token.as_bytes())
            .map_err(|e| ServerError::Internal(format!("HMAC key: {e}")))?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!(
            "vercel_blob_client_{store_id}_{}",
            STANDARD.encode(format!("{signature}.{payload}"))
        ))
    }
}

// ---------------------------------------------------------------------------
// Either
// ---------------------------------------------------------------------------

pub enum UploadStore {
    Local(LocalUploads),
    Blob(VercelBlob),
}

impl UploadStore {
    pub fn describe(&self) -> &'static str {
        match self {
            UploadStore::Local(_) => "local",
            UploadStore::Blob(_) => "vercel-blob",
        }
    }

    /// Store `data` under a sanitized, timestamped version of `original_name`
    /// and return its public URL.
    pub async fn store(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, ServerError> {
        let file_name = timestamped_name(original_name);
        match self {
            UploadStore::Local(local) => local.store(&file_name, &data).await,
            UploadStore::Blob(blob) => blob.put(&file_name, content_type, data).await,
        }
    }

    pub fn blob(&self) -> Option<&VercelBlob> {
        match self {
            UploadStore::Blob(blob) => Some(blob),
            UploadStore::Local(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("صورة.jpg"), "____.jpg");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn test_timestamped_name() {
        let name = timestamped_name("a b.png");
        let (stamp, rest) = name.split_once('_').unwrap();
        assert!(stamp.parse::<i64>().is_ok());
        assert_eq!(rest, "a_b.png");
    }

    #[test]
    fn test_ensure_within_rejects_escapes() {
        let base = Path::new("/srv/uploads");
        assert_eq!(
            ensure_within(base, "1_a.png").unwrap(),
            PathBuf::from("/srv/uploads/1_a.png")
        );
        assert!(ensure_within(base, "../x").is_err());
        assert!(ensure_within(base, "/etc/passwd").is_err());
        assert!(ensure_within(base, "a/b.png").is_err());
    }

    #[tokio::test]
    async fn test_local_store_writes_file_and_returns_url() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::Local(
            LocalUploads::new(dir.path().join("uploads")).await.unwrap(),
        );

        let url = store
            .store("cover art.png", Some("image/png"), Bytes::from_static(b"png"))
            .await
            .unwrap();

        let file_name = url.strip_prefix("/uploads/").unwrap();
        assert!(file_name.ends_with("_cover_art.png"));
        let written = std::fs::read(dir.path().join("uploads").join(file_name)).unwrap();
        assert_eq!(written, b"png");
    }

    #[test]
    fn test_client_token_is_signed_with_rw_token() {
        let token = "vercel_blob_rw_store123_supersecret".to_string();
        let blob = VercelBlob::new(token.clone(), DEFAULT_API.to_string()).unwrap();

        let client = blob.client_token("uploads/1_a.png", 1_000).unwrap();
        let encoded = client.strip_prefix("vercel_blob_client_store123_").unwrap();
        let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
        let (signature, payload) = decoded.split_once('.').unwrap();

        let mut mac = HmacSha256::new_from_slice(token.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        assert_eq!(signature, hex::encode(mac.finalize().into_bytes()));

        let constraints: serde_json::Value =
            serde_json::from_slice(&STANDARD.decode(payload).unwrap()).unwrap();
        assert_eq!(constraints["pathname"], "uploads/1_a.png");
        assert_eq!(constraints["validUntil"], 1_000 + CLIENT_TOKEN_TTL_MS);
        assert_eq!(constraints["allowedContentTypes"][1], "image/png");
    }

    #[test]
    fn test_malformed_rw_token_is_rejected() {
        let blob = VercelBlob::new("not-a-token".to_string(), DEFAULT_API.to_string()).unwrap();
        assert!(blob.client_token("uploads/a.png", 0).is_err());
    }

    const DEFAULT_API: &str = crate::config::DEFAULT_BLOB_API_URL;
}
