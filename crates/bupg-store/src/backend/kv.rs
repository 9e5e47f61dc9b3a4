use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{Backend, CollectionKey, RestCredentials};
use crate::error::{Result, StoreError};

/// Which hosted Redis is behind the REST endpoint. Both speak the same
/// command-array protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvProvider {
    UpstashRedis,
    VercelKv,
}

impl KvProvider {
    pub fn name(&self) -> &'static str {
        match self {
            KvProvider::UpstashRedis => "upstash-redis",
            KvProvider::VercelKv => "vercel-kv",
        }
    }
}

/// Collections stored as JSON strings under Redis keys, over HTTP.
///
/// Each command is `POST <url>` with a JSON array body such as
/// `["GET", "bupg:chats"]` and a bearer token. Replies are
/// `{"result": ...}` or `{"error": "..."}`.
pub struct RestKvBackend {
    provider: KvProvider,
    credentials: RestCredentials,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl RestKvBackend {
    pub fn new(provider: KvProvider, credentials: RestCredentials) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            provider,
            credentials,
            client,
        })
    }

    async fn command(&self, args: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.credentials.url.trim_end_matches('/'))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.credentials.token))
            .json(&args)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let reply: Option<RestReply> = serde_json::from_str(&body).ok();

        match reply {
            Some(RestReply {
                error: Some(message),
                ..
            }) => Err(StoreError::Remote(format!(
                "{} replied {status}: {message}",
                self.provider.name()
            ))),
            Some(reply) if status.is_success() => Ok(reply.result),
            _ => Err(StoreError::Remote(format!(
                "{} replied {status}: {body}",
                self.provider.name()
            ))),
        }
    }
}

#[async_trait]
impl Backend for RestKvBackend {
    fn describe(&self) -> &'static str {
        self.provider.name()
    }

    async fn load(&self, key: CollectionKey) -> Result<Option<String>> {
        let result = self.command(json!(["GET", key.kv_key()])).await?;
        debug!(key = key.kv_key(), provider = self.provider.name(), "KV read");
        match result {
            Value::Null => Ok(None),
            Value::String(raw) => Ok(Some(raw)),
            // Clients that auto-serialize can leave structured values behind.
            other => Ok(Some(other.to_string())),
        }
    }

    async fn save(&self, key: CollectionKey, json: String) -> Result<()> {
        let bytes = json.len();
        self.command(json!(["SET", key.kv_key(), json])).await?;
        debug!(key = key.kv_key(), provider = self.provider.name(), bytes, "KV write");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use tokio::sync::Mutex;

    type Db = Arc<Mutex<HashMap<String, String>>>;

    async fn fake_redis(
        State(db): State<Db>,
        headers: HeaderMap,
        Json(args): Json<Vec<String>>,
    ) -> (StatusCode, Json<Value>) {
        if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer secret") {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" })));
        }
        let mut db = db.lock().await;
        match args.first().map(String::as_str) {
            Some("GET") => {
                let value = db.get(&args[1]).cloned();
                (StatusCode::OK, Json(json!({ "result": value })))
            }
            Some("SET") => {
                db.insert(args[1].clone(), args[2].clone());
                (StatusCode::OK, Json(json!({ "result": "OK" })))
            }
            _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "ERR unknown command" }))),
        }
    }

    async fn spawn_fake(db: Db) -> String {
        let app = Router::new().route("/", post(fake_redis)).with_state(db);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn backend(url: String, token: &str) -> RestKvBackend {
        RestKvBackend::new(
            KvProvider::UpstashRedis,
            RestCredentials {
                url,
                token: token.to_string(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_get_set_roundtrip() {
        let db: Db = Arc::default();
        let kv = backend(spawn_fake(db.clone()).await, "secret");

        assert!(kv.load(CollectionKey::Products).await.unwrap().is_none());

        kv.save(CollectionKey::Products, r#"[{"id":"a"}]"#.into())
            .await
            .unwrap();
        assert_eq!(
            kv.load(CollectionKey::Products).await.unwrap().as_deref(),
            Some(r#"[{"id":"a"}]"#)
        );
        assert!(db.lock().await.contains_key("bupg:products"));
    }

    #[tokio::test]
    async fn test_error_reply_is_remote_error() {
        let db: Db = Arc::default();
        let kv = backend(spawn_fake(db).await, "wrong");

        let err = kv.load(CollectionKey::Chats).await.unwrap_err();
        assert!(matches!(err, StoreError::Remote(ref m) if m.contains("Unauthorized")));
    }
}
