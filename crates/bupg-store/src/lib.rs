//! # bupg-store
//!
//! Data-access layer for the bupg storefront.
//!
//! Two collections (products and chats) are read and written as whole JSON
//! documents against one of three backends: local files, Vercel KV or
//! Upstash Redis. The backend is chosen once at startup from
//! [`StorageSettings`]; everything above it works through the typed
//! [`Collection`] view and the CRUD helpers on [`Store`].

pub mod backend;
pub mod chats;
pub mod collection;
pub mod ids;
pub mod models;
pub mod products;
pub mod store;

mod error;

pub use backend::{select_backend, Backend, CollectionKey, RestCredentials, StorageSettings};
pub use collection::{Collection, Snapshot};
pub use error::{Result, StoreError};
pub use models::*;
pub use store::Store;
