//! Typed view over one stored collection.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::backend::{Backend, CollectionKey};
use crate::error::{Result, StoreError};

/// Result of a lenient read.
///
/// `records` is empty whenever `error` is set, so callers that only list
/// data can render it as-is; callers that must tell "no data" from "could
/// not read" check `error`.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub records: Vec<T>,
    pub error: Option<StoreError>,
}

impl<T> Snapshot<T> {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// A whole collection of `T`, read and written as one JSON array.
pub struct Collection<T> {
    backend: Arc<dyn Backend>,
    key: CollectionKey,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            key: self.key,
            _records: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(backend: Arc<dyn Backend>, key: CollectionKey) -> Self {
        Self {
            backend,
            key,
            _records: PhantomData,
        }
    }

    /// Read every record. Nothing stored yet reads as an empty collection.
    /// Records that do not decode are skipped, so the next write drops them.
    pub async fn read(&self) -> Result<Vec<T>> {
        let Some(raw) = self.backend.load(self.key).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Value>(&raw)? {
            Value::Array(items) => Ok(items
                .into_iter()
                .enumerate()
                .filter_map(|(index, item)| match serde_json::from_value(item) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!(key = ?self.key, index, error = %e, "Skipping unreadable record");
                        None
                    }
                })
                .collect()),
            _ => {
                warn!(key = ?self.key, "Stored collection is not an array, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Like [`read`](Self::read), but a failure yields an empty snapshot
    /// carrying the error instead of aborting.
    pub async fn read_lenient(&self) -> Snapshot<T> {
        match self.read().await {
            Ok(records) => Snapshot {
                records,
                error: None,
            },
            Err(error) => {
                warn!(key = ?self.key, error = %error, "Collection read degraded to empty");
                Snapshot {
                    records: Vec::new(),
                    error: Some(error),
                }
            }
        }
    }

    /// Replace the stored collection with `records`.
    pub async fn write(&self, records: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        self.backend.save(self.key, json).await
    }
}
