//! PostgreSQL-backed [`ProductStore`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use storefront_core::lookup::LookupTerm;
use storefront_core::pagination::PageRequest;
use storefront_core::types::DbId;

use super::ProductStore;
use crate::error::StoreError;
use crate::models::product::{NewProduct, Product, ProductImage, ProductWithImages};
use crate::repositories::ProductRepo;

/// Product store over a PostgreSQL pool. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    type Tx = Transaction<'static, Postgres>;

    async fn insert(
        &self,
        product: &NewProduct,
        image_urls: &[String],
    ) -> Result<ProductWithImages, StoreError> {
        Ok(ProductRepo::create_with_images(&self.pool, product, image_urls).await?)
    }

    async fn find(&self, term: &LookupTerm) -> Result<Option<ProductWithImages>, StoreError> {
        Ok(ProductRepo::find(&self.pool, term).await?)
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<ProductWithImages>, StoreError> {
        Ok(ProductRepo::list(&self.pool, page).await?)
    }

    async fn delete(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(ProductRepo::delete(&self.pool, id).await?)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        Ok(ProductRepo::delete_all(&self.pool).await?)
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(self.pool.begin().await?)
    }

    async fn lock_for_update(
        &self,
        tx: &mut Self::Tx,
        id: DbId,
    ) -> Result<Option<Product>, StoreError> {
        Ok(ProductRepo::find_for_update(tx, id).await?)
    }

    async fn delete_images(&self, tx: &mut Self::Tx, product_id: DbId) -> Result<u64, StoreError> {
        Ok(ProductRepo::delete_images(tx, product_id).await?)
    }

    async fn insert_images(
        &self,
        tx: &mut Self::Tx,
        product_id: DbId,
        urls: &[String],
    ) -> Result<Vec<ProductImage>, StoreError> {
        Ok(ProductRepo::insert_images(tx, product_id, urls).await?)
    }

    async fn save(&self, tx: &mut Self::Tx, product: &Product) -> Result<Product, StoreError> {
        Ok(ProductRepo::save(tx, product).await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError> {
        Ok(tx.rollback().await?)
    }
}
