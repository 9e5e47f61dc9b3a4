use serde::Deserialize;
use tracing::info;

use crate::collection::Snapshot;
use crate::error::{Result, StoreError};
use crate::ids;
use crate::models::{Category, Product};
use crate::store::Store;

/// Title given to products created without one ("new product").
pub const DEFAULT_TITLE: &str = "منتج جديد";
/// Image given to products created without one.
pub const PLACEHOLDER_IMAGE: &str = "/uploads/placeholder.svg";

/// Fields accepted when creating a product. Anything missing gets a default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDraft {
    pub id: Option<String>,
    pub category: Option<Category>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Fields accepted when updating a product. Only present fields change;
/// an `id` in the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub category: Option<Category>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub image: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn check_price(price: f64) -> Result<f64> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(StoreError::Invalid(format!(
            "price must be a non-negative number, got {price}"
        )))
    }
}

impl ProductDraft {
    fn into_product(self) -> Result<Product> {
        let price = check_price(self.price.unwrap_or(0.0))?;
        let id = non_empty(self.id).unwrap_or_else(|| {
            ids::generate(
                self.category
                    .map(|c| c.as_str())
                    .unwrap_or(ids::PRODUCT_PREFIX),
            )
        });

        Ok(Product {
            id,
            category: self.category.unwrap_or_default(),
            title: non_empty(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            price,
            description: self.description.unwrap_or_default(),
            image: Some(non_empty(self.image).unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())),
        })
    }
}

impl ProductPatch {
    fn apply(self, product: &mut Product) -> Result<()> {
        if let Some(price) = self.price {
            product.price = check_price(price)?;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(title) = self.title {
            product.title = title;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(image) = self.image {
            product.image = Some(image);
        }
        Ok(())
    }
}

impl Store {
    /// All products, or only those whose category matches `category`, in
    /// collection order. An unknown category matches nothing.
    pub async fn list_products(&self, category: Option<&str>) -> Snapshot<Product> {
        let mut snapshot = self.products.read_lenient().await;
        if let Some(category) = category {
            snapshot.records.retain(|p| p.category.as_str() == category);
        }
        snapshot
    }

    pub async fn find_product(&self, id: &str) -> Result<Option<Product>> {
        let products = self.products.read().await?;
        Ok(products.into_iter().find(|p| p.id == id))
    }

    /// Create a product from `draft` and put it at the front of the collection.
    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product> {
        let product = draft.into_product()?;
        let mut products = self.products.read().await?;

        if products.iter().any(|p| p.id == product.id) {
            return Err(StoreError::Conflict(format!(
                "product {} already exists",
                product.id
            )));
        }

        products.insert(0, product.clone());
        self.products.write(&products).await?;

        info!(id = %product.id, category = %product.category, "Product created");
        Ok(product)
    }

    /// Shallow-merge `patch` onto the stored product. The id never changes.
    pub async fn update_product(&self, id: &str, patch: ProductPatch) -> Result<Product> {
        let mut products = self.products.read().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound)?;

        patch.apply(product)?;
        let updated = product.clone();
        self.products.write(&products).await?;

        info!(id = %updated.id, "Product updated");
        Ok(updated)
    }

    pub async fn delete_product(&self, id: &str) -> Result<()> {
        let mut products = self.products.read().await?;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(StoreError::NotFound);
        }

        self.products.write(&products).await?;
        info!(id, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalFileBackend;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_store() -> (Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Store::with_backend(Arc::new(LocalFileBackend::new(dir.path().to_path_buf())));
        (store, dir)
    }

    fn draft(category: Category, title: &str) -> ProductDraft {
        ProductDraft {
            category: Some(category),
            title: Some(title.to_string()),
            price: Some(100.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_fills_defaults() {
        let (store, _dir) = test_store();
        let product = store.create_product(ProductDraft::default()).await.unwrap();

        assert!(product.id.starts_with("product-"));
        assert_eq!(product.category, Category::Pubg);
        assert_eq!(product.title, DEFAULT_TITLE);
        assert_eq!(product.price, 0.0);
        assert_eq!(product.description, "");
        assert_eq!(product.image.as_deref(), Some(PLACEHOLDER_IMAGE));
    }

    #[tokio::test]
    async fn test_create_prefixes_id_with_category() {
        let (store, _dir) = test_store();
        let product = store
            .create_product(draft(Category::FreeFire, "Rare bundle"))
            .await
            .unwrap();
        assert!(product.id.starts_with("free-fire-"));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price_and_duplicate_id() {
        let (store, _dir) = test_store();
        let negative = ProductDraft {
            price: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            store.create_product(negative).await,
            Err(StoreError::Invalid(_))
        ));

        let fixed = ProductDraft {
            id: Some("fixed".into()),
            ..Default::default()
        };
        store.create_product(fixed.clone()).await.unwrap();
        assert!(matches!(
            store.create_product(fixed).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_in_collection_order() {
        let (store, _dir) = test_store();
        let a = store.create_product(draft(Category::Pubg, "a")).await.unwrap();
        store.create_product(draft(Category::Topup, "b")).await.unwrap();
        let c = store.create_product(draft(Category::Pubg, "c")).await.unwrap();

        let pubg = store.list_products(Some("pubg")).await.records;
        // Newest first: creation prepends.
        assert_eq!(
            pubg.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec![c.id.as_str(), a.id.as_str()]
        );
        assert_eq!(store.list_products(None).await.records.len(), 3);
        assert!(store.list_products(Some("steam")).await.records.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_keeps_id() {
        let (store, _dir) = test_store();
        let created = store.create_product(draft(Category::Pubg, "old")).await.unwrap();

        let updated = store
            .update_product(
                &created.id,
                ProductPatch {
                    title: Some("new".into()),
                    price: Some(250.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "new");
        assert_eq!(updated.price, 250.0);
        assert_eq!(updated.category, Category::Pubg);
        assert_eq!(store.find_product(&created.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_is_not_found() {
        let (store, _dir) = test_store();
        let kept = store.create_product(draft(Category::Pubg, "kept")).await.unwrap();

        assert!(matches!(
            store.update_product("nope", ProductPatch::default()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete_product("nope").await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.list_products(None).await.records, vec![kept]);
    }

    #[tokio::test]
    async fn test_delete_removes_only_target() {
        let (store, _dir) = test_store();
        let a = store.create_product(draft(Category::Pubg, "a")).await.unwrap();
        let b = store.create_product(draft(Category::Pubg, "b")).await.unwrap();

        store.delete_product(&a.id).await.unwrap();
        assert_eq!(store.list_products(None).await.records, vec![b]);
    }
}
