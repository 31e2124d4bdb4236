//! The product store seam used by the catalog service.
//!
//! [`ProductStore`] is the set of primitives the catalog needs: one-shot
//! reads and writes, plus a transaction handle for the update protocol.
//! Two implementations ship with the crate:
//!
//! - [`PgProductStore`]: PostgreSQL via [`ProductRepo`](crate::repositories::ProductRepo).
//! - [`InMemoryProductStore`]: an arena of owned product records, for tests
//!   and local tooling.
//!
//! Transaction contract: every change made through a `Tx` becomes visible
//! to other readers only on [`ProductStore::commit`]. Dropping a `Tx`
//! without committing discards its changes and releases its resources.

use async_trait::async_trait;
use storefront_core::lookup::LookupTerm;
use storefront_core::pagination::PageRequest;
use storefront_core::types::DbId;

use crate::error::StoreError;
use crate::models::product::{NewProduct, Product, ProductImage, ProductWithImages};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryProductStore;
pub use postgres::PgProductStore;

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// An open transaction.
    type Tx: Send;

    /// Persist a product and one owned image per URL, atomically.
    async fn insert(
        &self,
        product: &NewProduct,
        image_urls: &[String],
    ) -> Result<ProductWithImages, StoreError>;

    /// Resolve a lookup term to at most one product, images included.
    async fn find(&self, term: &LookupTerm) -> Result<Option<ProductWithImages>, StoreError>;

    /// One page of products with their images, in insertion order.
    async fn list(&self, page: PageRequest) -> Result<Vec<ProductWithImages>, StoreError>;

    /// Remove a product and its images. Returns `true` if it existed.
    async fn delete(&self, id: DbId) -> Result<bool, StoreError>;

    /// Remove every product and image. Returns the number of products removed.
    async fn delete_all(&self) -> Result<u64, StoreError>;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Read a product inside `tx`, holding it against concurrent writers
    /// until the transaction ends.
    async fn lock_for_update(
        &self,
        tx: &mut Self::Tx,
        id: DbId,
    ) -> Result<Option<Product>, StoreError>;

    /// Delete every image owned by `product_id`. Returns the number removed.
    async fn delete_images(&self, tx: &mut Self::Tx, product_id: DbId) -> Result<u64, StoreError>;

    /// Attach one fresh image per URL to `product_id`, in order.
    async fn insert_images(
        &self,
        tx: &mut Self::Tx,
        product_id: DbId,
        urls: &[String],
    ) -> Result<Vec<ProductImage>, StoreError>;

    /// Write the scalar fields of a locked product back.
    async fn save(&self, tx: &mut Self::Tx, product: &Product) -> Result<Product, StoreError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;
}
