//! The [`Store`] handle shared by request handlers.
//!
//! Product and chat operations live in their own modules as `impl Store`
//! blocks. Every mutation is a read-modify-write of the whole collection
//! and is not serialized against other writers: two concurrent edits to the
//! same collection race and the last write wins.

use std::sync::Arc;

use crate::backend::{select_backend, Backend, CollectionKey, StorageSettings};
use crate::collection::Collection;
use crate::error::Result;
use crate::models::{Chat, Product};

#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
    pub(crate) products: Collection<Product>,
    pub(crate) chats: Collection<Chat>,
}

impl Store {
    /// Open the store on the backend chosen by `settings`.
    pub fn open(settings: &StorageSettings) -> Result<Self> {
        Ok(Self::with_backend(select_backend(settings)?))
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            products: Collection::new(backend.clone(), CollectionKey::Products),
            chats: Collection::new(backend.clone(), CollectionKey::Chats),
            backend,
        }
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.describe()
    }
}
