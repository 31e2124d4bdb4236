//! In-memory [`ProductStore`].
//!
//! Products live in an arena keyed by product id; each entry owns its image
//! list, so an image cannot exist without its product or be shared between
//! products. The store enforces the same unique and CHECK constraints as the
//! PostgreSQL schema and reports violations with the same SQLSTATE and
//! detail text.
//!
//! Writers (transactions and one-shot writes) serialize on a single async
//! mutex. A transaction stages its changes on private copies of the records
//! it touches and swaps them into the arena on commit, so readers only ever
//! see committed records.
//!
//! Do not issue one-shot writes from a task that holds an open transaction
//! on the same store: the write waits for the transaction's writer guard.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use storefront_core::lookup::LookupTerm;
use storefront_core::pagination::PageRequest;
use storefront_core::types::{DbId, ImageId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::ProductStore;
use crate::error::StoreError;
use crate::models::product::{NewProduct, Product, ProductImage, ProductWithImages};

/// SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// SQLSTATE for `check_violation`.
const CHECK_VIOLATION: &str = "23514";

/// Reject rows the `products` CHECK constraints would refuse.
fn check_row(title: &str, slug: &str) -> Result<(), StoreError> {
    let violated = if title.is_empty() {
        "products_title_check"
    } else if slug.is_empty() {
        "products_slug_check"
    } else {
        return Ok(());
    };
    Err(StoreError::Memory {
        code: CHECK_VIOLATION,
        message: format!(
            "new row for relation \"products\" violates check constraint \"{violated}\""
        ),
        detail: None,
    })
}

/// A product together with the images it owns.
#[derive(Debug, Clone)]
struct OwnedRecord {
    product: Product,
    images: Vec<ProductImage>,
}

impl OwnedRecord {
    fn to_aggregate(&self) -> ProductWithImages {
        ProductWithImages {
            product: self.product.clone(),
            images: self.images.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Arena {
    records: HashMap<DbId, OwnedRecord>,
    /// Product ids in insertion order.
    order: Vec<DbId>,
}

impl Arena {
    /// Reject `title`/`slug` values already used by a product other than `id`.
    fn check_unique(&self, id: DbId, title: &str, slug: &str) -> Result<(), StoreError> {
        let others = self.records.values().filter(|r| r.product.id != id);
        for record in others {
            if record.product.title == title {
                return Err(StoreError::unique_violation("uq_products_title", "title", title));
            }
            if record.product.slug == slug {
                return Err(StoreError::unique_violation("uq_products_slug", "slug", slug));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Inner {
    arena: RwLock<Arena>,
    writer: Arc<Mutex<()>>,
    last_image_id: AtomicI64,
}

/// Arena-backed product store. Clones share the same data.
#[derive(Debug, Clone)]
pub struct InMemoryProductStore {
    inner: Arc<Inner>,
}

/// An open in-memory transaction.
#[derive(Debug)]
pub struct MemoryTx {
    _writer: OwnedMutexGuard<()>,
    staged: HashMap<DbId, OwnedRecord>,
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                arena: RwLock::new(Arena::default()),
                writer: Arc::new(Mutex::new(())),
                last_image_id: AtomicI64::new(0),
            }),
        }
    }

    /// Number of committed products.
    pub fn product_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.records.len())
    }

    /// Number of committed images across all products.
    pub fn image_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.records.values().map(|r| r.images.len()).sum())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Arena>, StoreError> {
        self.inner
            .arena
            .read()
            .map_err(|_| StoreError::internal("product arena lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Arena>, StoreError> {
        self.inner
            .arena
            .write()
            .map_err(|_| StoreError::internal("product arena lock poisoned"))
    }

    async fn acquire_writer(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.inner.writer).lock_owned().await
    }

    fn next_image_id(&self) -> ImageId {
        self.inner.last_image_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// The staged copy of `id` in `tx`, staging it from the arena first if
    /// needed. `None` if the product does not exist.
    fn staged<'tx>(
        &self,
        tx: &'tx mut MemoryTx,
        id: DbId,
    ) -> Result<Option<&'tx mut OwnedRecord>, StoreError> {
        if !tx.staged.contains_key(&id) {
            let committed = self.read()?.records.get(&id).cloned();
            match committed {
                Some(record) => {
                    tx.staged.insert(id, record);
                }
                None => return Ok(None),
            }
        }
        Ok(tx.staged.get_mut(&id))
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    type Tx = MemoryTx;

    async fn insert(
        &self,
        product: &NewProduct,
        image_urls: &[String],
    ) -> Result<ProductWithImages, StoreError> {
        let _writer = self.acquire_writer().await;
        let mut arena = self.write()?;

        check_row(&product.title, &product.slug)?;
        arena.check_unique(product.id, &product.title, &product.slug)?;
        if arena.records.contains_key(&product.id) {
            return Err(StoreError::unique_violation(
                "products_pkey",
                "id",
                &product.id.to_string(),
            ));
        }

        let now = Utc::now();
        let record = OwnedRecord {
            product: Product {
                id: product.id,
                title: product.title.clone(),
                slug: product.slug.clone(),
                price: product.price,
                description: product.description.clone(),
                stock: product.stock,
                sizes: product.sizes.clone(),
                gender: product.gender,
                tags: product.tags.clone(),
                created_at: now,
                updated_at: now,
            },
            images: image_urls
                .iter()
                .map(|url| ProductImage {
                    id: self.next_image_id(),
                    url: url.clone(),
                    product_id: product.id,
                })
                .collect(),
        };

        let aggregate = record.to_aggregate();
        arena.order.push(product.id);
        arena.records.insert(product.id, record);
        Ok(aggregate)
    }

    async fn find(&self, term: &LookupTerm) -> Result<Option<ProductWithImages>, StoreError> {
        let arena = self.read()?;
        let found = match term {
            LookupTerm::Id(id) => arena.records.get(id),
            LookupTerm::Text { .. } => arena
                .order
                .iter()
                .filter_map(|id| arena.records.get(id))
                .find(|r| term.matches(r.product.id, &r.product.title, &r.product.slug)),
        };
        Ok(found.map(OwnedRecord::to_aggregate))
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<ProductWithImages>, StoreError> {
        let arena = self.read()?;
        let offset = usize::try_from(page.offset).unwrap_or_default();
        let limit = usize::try_from(page.limit).unwrap_or_default();
        Ok(arena
            .order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|id| arena.records.get(id))
            .map(OwnedRecord::to_aggregate)
            .collect())
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        let _writer = self.acquire_writer().await;
        let mut arena = self.write()?;
        let removed = arena.records.remove(&id).is_some();
        if removed {
            arena.order.retain(|existing| *existing != id);
        }
        Ok(removed)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let _writer = self.acquire_writer().await;
        let mut arena = self.write()?;
        let removed = arena.records.len() as u64;
        arena.records.clear();
        arena.order.clear();
        Ok(removed)
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(MemoryTx {
            _writer: self.acquire_writer().await,
            staged: HashMap::new(),
        })
    }

    async fn lock_for_update(
        &self,
        tx: &mut Self::Tx,
        id: DbId,
    ) -> Result<Option<Product>, StoreError> {
        Ok(self.staged(tx, id)?.map(|record| record.product.clone()))
    }

    async fn delete_images(&self, tx: &mut Self::Tx, product_id: DbId) -> Result<u64, StoreError> {
        match self.staged(tx, product_id)? {
            Some(record) => {
                let removed = record.images.len() as u64;
                record.images.clear();
                Ok(removed)
            }
            None => Ok(0),
        }
    }

    async fn insert_images(
        &self,
        tx: &mut Self::Tx,
        product_id: DbId,
        urls: &[String],
    ) -> Result<Vec<ProductImage>, StoreError> {
        let Some(record) = self.staged(tx, product_id)? else {
            return Err(StoreError::Memory {
                code: FOREIGN_KEY_VIOLATION,
                message: "insert or update on table \"product_images\" violates foreign key \
                          constraint \"product_images_product_id_fkey\""
                    .to_string(),
                detail: Some(format!(
                    "Key (product_id)=({product_id}) is not present in table \"products\"."
                )),
            });
        };

        let images: Vec<ProductImage> = urls
            .iter()
            .map(|url| ProductImage {
                id: self.next_image_id(),
                url: url.clone(),
                product_id,
            })
            .collect();
        record.images.extend(images.iter().cloned());
        Ok(images)
    }

    async fn save(&self, tx: &mut Self::Tx, product: &Product) -> Result<Product, StoreError> {
        check_row(&product.title, &product.slug)?;
        self.read()?
            .check_unique(product.id, &product.title, &product.slug)?;

        let Some(record) = self.staged(tx, product.id)? else {
            return Err(StoreError::internal(format!(
                "no product row with id {} to save",
                product.id
            )));
        };

        record.product = Product {
            updated_at: Utc::now(),
            created_at: record.product.created_at,
            ..product.clone()
        };
        Ok(record.product.clone())
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        let MemoryTx { _writer, staged } = tx;
        let mut arena = self.write()?;
        for (id, record) in staged {
            if let Some(slot) = arena.records.get_mut(&id) {
                *slot = record;
            }
        }
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError> {
        drop(tx);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use uuid::Uuid;

    use super::*;
    use crate::error::UNIQUE_VIOLATION;
    use crate::models::product::Gender;

    fn new_product(title: &str) -> NewProduct {
        NewProduct {
            id: Uuid::now_v7(),
            title: title.to_string(),
            slug: storefront_core::slug::normalize_slug(title),
            price: 10.0,
            description: None,
            stock: 1,
            sizes: vec!["M".into()],
            gender: Gender::Unisex,
            tags: vec![],
        }
    }

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn insert_assigns_increasing_image_ids_in_order() {
        let store = InMemoryProductStore::new();
        let created = store
            .insert(&new_product("Tee"), &urls(&["a.jpg", "b.jpg", "c.jpg"]))
            .await
            .unwrap();

        assert_eq!(created.image_urls(), urls(&["a.jpg", "b.jpg", "c.jpg"]));
        let ids: Vec<ImageId> = created.images.iter().map(|i| i.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_slug() {
        let store = InMemoryProductStore::new();
        store.insert(&new_product("Tee"), &[]).await.unwrap();

        let mut clash = new_product("Other Tee");
        clash.slug = "tee".to_string();
        let err = store.insert(&clash, &[]).await.unwrap_err();

        assert_eq!(err.code().as_deref(), Some(UNIQUE_VIOLATION));
        assert_eq!(err.detail().as_deref(), Some("Key (slug)=(tee) already exists."));
        assert_eq!(store.product_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn staged_changes_are_invisible_until_commit() {
        let store = InMemoryProductStore::new();
        let created = store
            .insert(&new_product("Tee"), &urls(&["old.jpg"]))
            .await
            .unwrap();
        let id = created.product.id;

        let mut tx = store.begin().await.unwrap();
        store.lock_for_update(&mut tx, id).await.unwrap().unwrap();
        store.delete_images(&mut tx, id).await.unwrap();
        store
            .insert_images(&mut tx, id, &urls(&["new.jpg"]))
            .await
            .unwrap();

        let during = store.find(&LookupTerm::Id(id)).await.unwrap().unwrap();
        assert_eq!(during.image_urls(), urls(&["old.jpg"]));

        store.commit(tx).await.unwrap();

        let after = store.find(&LookupTerm::Id(id)).await.unwrap().unwrap();
        assert_eq!(after.image_urls(), urls(&["new.jpg"]));
    }

    #[tokio::test]
    async fn dropping_a_transaction_discards_its_changes() {
        let store = InMemoryProductStore::new();
        let created = store
            .insert(&new_product("Tee"), &urls(&["old.jpg"]))
            .await
            .unwrap();
        let id = created.product.id;

        {
            let mut tx = store.begin().await.unwrap();
            store.delete_images(&mut tx, id).await.unwrap();
        }

        let after = store.find(&LookupTerm::Id(id)).await.unwrap().unwrap();
        assert_eq!(after.image_urls(), urls(&["old.jpg"]));
        // The writer guard was released with the dropped transaction.
        assert!(store.delete(id).await.unwrap());
    }

    #[tokio::test]
    async fn insert_images_for_missing_product_is_a_foreign_key_violation() {
        let store = InMemoryProductStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = store
            .insert_images(&mut tx, Uuid::now_v7(), &urls(&["x.jpg"]))
            .await
            .unwrap_err();
        assert_eq!(err.code().as_deref(), Some(FOREIGN_KEY_VIOLATION));
    }

    #[tokio::test]
    async fn empty_slug_violates_check_constraint() {
        let store = InMemoryProductStore::new();
        let mut product = new_product("Tee");
        product.slug = String::new();

        let err = store.insert(&product, &[]).await.unwrap_err();

        assert_eq!(err.code().as_deref(), Some(CHECK_VIOLATION));
        assert!(err.to_string().contains("products_slug_check"));
        assert_eq!(store.product_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn save_rejects_title_taken_by_another_product() {
        let store = InMemoryProductStore::new();
        store.insert(&new_product("Tee"), &[]).await.unwrap();
        let other = store.insert(&new_product("Hoodie"), &[]).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let mut product = store
            .lock_for_update(&mut tx, other.product.id)
            .await
            .unwrap()
            .unwrap();
        product.title = "Tee".to_string();

        let err = store.save(&mut tx, &product).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn text_lookup_prefers_earliest_inserted_match() {
        let store = InMemoryProductStore::new();
        let first = store.insert(&new_product("Alpha"), &[]).await.unwrap();
        let mut second = new_product("Beta");
        second.slug = "alpha_slug".to_string();
        store.insert(&second, &[]).await.unwrap();

        // "ALPHA" matches the first by title; nothing else matches.
        let found = store.find(&LookupTerm::parse("ALPHA")).await.unwrap().unwrap();
        assert_eq!(found.product.id, first.product.id);

        let by_slug = store
            .find(&LookupTerm::parse("Alpha_Slug"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.product.title, "Beta");
    }

    #[tokio::test]
    async fn delete_removes_owned_images() {
        let store = InMemoryProductStore::new();
        let created = store
            .insert(&new_product("Tee"), &urls(&["a.jpg", "b.jpg"]))
            .await
            .unwrap();
        assert_eq!(store.image_count().unwrap(), 2);

        assert!(store.delete(created.product.id).await.unwrap());
        assert_eq!(store.image_count().unwrap(), 0);
        assert_matches!(store.find(&LookupTerm::Id(created.product.id)).await, Ok(None));
        assert!(!store.delete(created.product.id).await.unwrap());
    }

    #[tokio::test]
    async fn list_pages_in_insertion_order() {
        let store = InMemoryProductStore::new();
        for title in ["P1", "P2", "P3", "P4", "P5"] {
            store.insert(&new_product(title), &[]).await.unwrap();
        }

        let page = store
            .list(PageRequest { limit: 2, offset: 1 })
            .await
            .unwrap();
        let titles: Vec<&str> = page.iter().map(|p| p.product.title.as_str()).collect();
        assert_eq!(titles, vec!["P2", "P3"]);
    }
}
