use chrono::Utc;
use tracing::{debug, info};

use crate::collection::Snapshot;
use crate::error::{Result, StoreError};
use crate::ids;
use crate::models::{Chat, Message, ProductSnapshot, Sender};
use crate::store::Store;

/// A customer opening a support thread about a product.
#[derive(Debug, Clone)]
pub struct NewChat {
    pub product_id: String,
    pub customer_name: String,
    pub whatsapp: Option<String>,
    /// First customer message.
    pub text: String,
}

impl Store {
    /// Every chat, newest first. Read failures degrade to an empty list
    /// with the error attached.
    pub async fn list_chats(&self) -> Snapshot<Chat> {
        let mut snapshot = self.chats.read_lenient().await;
        snapshot
            .records
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshot
    }

    pub async fn get_chat(&self, id: &str) -> Result<Chat> {
        self.chats
            .read()
            .await?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)
    }

    /// Open a chat, snapshotting the referenced product if it can be found.
    ///
    /// The product lookup is best-effort: an unknown product id or a failed
    /// read leaves the snapshot fields empty.
    pub async fn create_chat(&self, new: NewChat) -> Result<Chat> {
        let product = match self.find_product(&new.product_id).await {
            Ok(found) => found,
            Err(e) => {
                debug!(product = %new.product_id, error = %e, "Product lookup for chat failed");
                None
            }
        };

        let mut chats = self.chats.read().await?;
        let now = Utc::now();
        let chat = Chat {
            id: ids::generate(ids::CHAT_PREFIX),
            product_title: product.as_ref().map(|p| p.title.clone()),
            product: product.as_ref().map(ProductSnapshot::from),
            product_id: new.product_id,
            customer_name: new.customer_name,
            whatsapp: new.whatsapp,
            created_at: now,
            messages: vec![Message {
                id: ids::generate(ids::MESSAGE_PREFIX),
                from: Sender::Customer,
                text: new.text,
                created_at: now,
            }],
        };

        chats.insert(0, chat.clone());
        self.chats.write(&chats).await?;

        info!(id = %chat.id, product = %chat.product_id, "Chat opened");
        Ok(chat)
    }

    /// Append a message to the end of a chat and return the updated chat.
    pub async fn append_message(&self, chat_id: &str, from: Sender, text: String) -> Result<Chat> {
        let mut chats = self.chats.read().await?;
        let chat = chats
            .iter_mut()
            .find(|c| c.id == chat_id)
            .ok_or(StoreError::NotFound)?;

        chat.messages.push(Message {
            id: ids::generate(ids::MESSAGE_PREFIX),
            from,
            text,
            created_at: Utc::now(),
        });
        let updated = chat.clone();
        self.chats.write(&chats).await?;

        debug!(chat = chat_id, from = ?from, count = updated.messages.len(), "Message appended");
        Ok(updated)
    }

    pub async fn delete_chat(&self, id: &str) -> Result<()> {
        let mut chats = self.chats.read().await?;
        let before = chats.len();
        chats.retain(|c| c.id != id);
        if chats.len() == before {
            return Err(StoreError::NotFound);
        }

        self.chats.write(&chats).await?;
        info!(id, "Chat deleted");
        Ok(())
    }

    /// Remove one message; the others keep their relative order.
    pub async fn delete_message(&self, chat_id: &str, message_id: &str) -> Result<()> {
        let mut chats = self.chats.read().await?;
        let chat = chats
            .iter_mut()
            .find(|c| c.id == chat_id)
            .ok_or(StoreError::NotFound)?;

        let before = chat.messages.len();
        chat.messages.retain(|m| m.id != message_id);
        if chat.messages.len() == before {
            return Err(StoreError::NotFound);
        }

        self.chats.write(&chats).await?;
        info!(chat = chat_id, message = message_id, "Message deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{CollectionKey, LocalFileBackend};
    use crate::models::Category;
    use crate::products::{ProductDraft, ProductPatch};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_store() -> (Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Store::with_backend(Arc::new(LocalFileBackend::new(dir.path().to_path_buf())));
        (store, dir)
    }

    fn new_chat(product_id: &str) -> NewChat {
        NewChat {
            product_id: product_id.to_string(),
            customer_name: "Ali".to_string(),
            whatsapp: Some("0550123456".to_string()),
            text: "hi".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_snapshots_product() {
        let (store, _dir) = test_store();
        let product = store
            .create_product(ProductDraft {
                category: Some(Category::Pubg),
                price: Some(500.0),
                ..Default::default()
            })
            .await
            .unwrap();

        let chat = store.create_chat(new_chat(&product.id)).await.unwrap();
        assert_eq!(chat.product_title.as_deref(), Some(product.title.as_str()));
        assert_eq!(chat.product, Some(ProductSnapshot::from(&product)));
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.messages[0].from, Sender::Customer);
        assert_eq!(chat.messages[0].text, "hi");
        assert_eq!(store.get_chat(&chat.id).await.unwrap(), chat);
    }

    #[tokio::test]
    async fn test_unknown_product_leaves_snapshot_empty() {
        let (store, _dir) = test_store();
        let chat = store.create_chat(new_chat("ghost")).await.unwrap();
        assert!(chat.product.is_none());
        assert!(chat.product_title.is_none());
        assert_eq!(chat.product_id, "ghost");
    }

    #[tokio::test]
    async fn test_unreadable_products_do_not_block_chat() {
        let (store, dir) = test_store();
        std::fs::write(dir.path().join(CollectionKey::Products.file_name()), "{{").unwrap();
        let chat = store.create_chat(new_chat("p1")).await.unwrap();
        assert!(chat.product.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_survives_product_edit_and_delete() {
        let (store, _dir) = test_store();
        let product = store
            .create_product(ProductDraft {
                price: Some(500.0),
                ..Default::default()
            })
            .await
            .unwrap();
        let chat = store.create_chat(new_chat(&product.id)).await.unwrap();

        store
            .update_product(
                &product.id,
                ProductPatch {
                    price: Some(1.0),
                    title: Some("renamed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let after_edit = store.get_chat(&chat.id).await.unwrap();
        assert_eq!(after_edit.product.as_ref().unwrap().price, 500.0);

        store.delete_product(&product.id).await.unwrap();
        let after_delete = store.get_chat(&chat.id).await.unwrap();
        assert_eq!(after_delete.product, chat.product);
        assert_eq!(after_delete.product_title, chat.product_title);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (store, _dir) = test_store();
        let first = store.create_chat(new_chat("p")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create_chat(new_chat("p")).await.unwrap();

        let listed = store.list_chats().await;
        assert!(!listed.is_degraded());
        let ids: Vec<_> = listed.records.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_append_preserves_order_and_delete_keeps_rest() {
        let (store, _dir) = test_store();
        let chat = store.create_chat(new_chat("p")).await.unwrap();

        store
            .append_message(&chat.id, Sender::Admin, "hello".into())
            .await
            .unwrap();
        let updated = store
            .append_message(&chat.id, Sender::Customer, "thanks".into())
            .await
            .unwrap();

        let texts: Vec<_> = updated.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hi", "hello", "thanks"]);

        let middle = updated.messages[1].id.clone();
        store.delete_message(&chat.id, &middle).await.unwrap();

        let remaining = store.get_chat(&chat.id).await.unwrap();
        let texts: Vec<_> = remaining.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["hi", "thanks"]);
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found_and_change_nothing() {
        let (store, _dir) = test_store();
        let chat = store.create_chat(new_chat("p")).await.unwrap();

        assert!(matches!(store.get_chat("nope").await, Err(StoreError::NotFound)));
        assert!(matches!(
            store.append_message("nope", Sender::Customer, "x".into()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(store.delete_chat("nope").await, Err(StoreError::NotFound)));
        assert!(matches!(
            store.delete_message(&chat.id, "nope").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete_message("nope", "nope").await,
            Err(StoreError::NotFound)
        ));

        assert_eq!(store.list_chats().await.records, vec![chat]);
    }

    #[tokio::test]
    async fn test_delete_chat() {
        let (store, _dir) = test_store();
        let chat = store.create_chat(new_chat("p")).await.unwrap();
        store.delete_chat(&chat.id).await.unwrap();
        assert!(store.list_chats().await.records.is_empty());
    }
}
