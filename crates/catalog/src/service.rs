//! Catalog operations over a [`ProductStore`].

use storefront_core::error::CoreError;
use storefront_core::lookup::LookupTerm;
use storefront_core::pagination::PaginationParams;
use storefront_core::types::DbId;
use storefront_db::models::product::{
    CreateProduct, FlatProduct, NewProduct, Product, ProductWithImages, UpdateProduct,
};
use storefront_db::store::ProductStore;
use storefront_db::StoreError;
use validator::{Validate, ValidationErrors};

use crate::classify::ErrorClassifier;

const ENTITY: &str = "Product";

/// Product catalog backed by a [`ProductStore`].
#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
    classifier: ErrorClassifier,
}

impl<S: ProductStore> CatalogService<S> {
    /// Service whose hidden failures are logged through `tracing`.
    pub fn new(store: S) -> Self {
        Self::with_classifier(store, ErrorClassifier::default())
    }

    pub fn with_classifier(store: S, classifier: ErrorClassifier) -> Self {
        Self { store, classifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a product and its images in one transaction.
    ///
    /// The returned images are the input URLs, in input order.
    pub async fn create(&self, input: CreateProduct) -> Result<FlatProduct, CoreError> {
        input.validate().map_err(validation_error)?;

        let new = NewProduct::from_input(&input)?;
        let created = self
            .store
            .insert(&new, &input.images)
            .await
            .map_err(|e| self.classifier.classify("create", e))?;

        tracing::info!(
            id = %created.product.id,
            slug = %created.product.slug,
            images = created.images.len(),
            "Product created"
        );
        Ok(created.into_flat())
    }

    /// One page of products in insertion order, images flattened to URLs.
    ///
    /// A limit below 1 or a negative offset is a validation error.
    pub async fn find_all(&self, params: PaginationParams) -> Result<Vec<FlatProduct>, CoreError> {
        let page = params.resolve()?;
        let products = self
            .store
            .list(page)
            .await
            .map_err(|e| self.classifier.classify("find_all", e))?;
        Ok(products.into_iter().map(ProductWithImages::into_flat).collect())
    }

    /// Resolve `term` (an id, a title, or a slug) to one product.
    pub async fn find_one(&self, term: &str) -> Result<ProductWithImages, CoreError> {
        let lookup = LookupTerm::parse(term);
        self.store
            .find(&lookup)
            .await
            .map_err(|e| self.classifier.classify("find_one", e))?
            .ok_or_else(|| CoreError::not_found(ENTITY, "term", term))
    }

    /// [`find_one`](Self::find_one) with images flattened to URLs.
    pub async fn find_one_plain(&self, term: &str) -> Result<FlatProduct, CoreError> {
        Ok(self.find_one(term).await?.into_flat())
    }

    /// Apply a partial update to the product `id`.
    ///
    /// The product row is locked for the duration of the transaction. When
    /// `input.images` is present the image set is replaced as a whole;
    /// readers see either the old set or the new one. Any failure rolls
    /// the transaction back.
    pub async fn update(&self, id: DbId, input: UpdateProduct) -> Result<FlatProduct, CoreError> {
        input.validate().map_err(validation_error)?;

        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| self.classifier.classify("update", e))?;

        let locked = match self.store.lock_for_update(&mut tx, id).await {
            Ok(locked) => locked,
            Err(err) => return Err(self.abort(tx, "update", err).await),
        };
        let Some(mut product) = locked else {
            self.release(tx, "update").await;
            return Err(CoreError::not_found(ENTITY, "id", id.to_string()));
        };

        if let Err(err) = product.apply_update(&input) {
            self.release(tx, "update").await;
            return Err(err);
        }

        if let Err(err) = self
            .write_update(&mut tx, &product, input.images.as_deref())
            .await
        {
            return Err(self.abort(tx, "update", err).await);
        }

        self.store
            .commit(tx)
            .await
            .map_err(|e| self.classifier.classify("update", e))?;

        tracing::info!(
            %id,
            images_replaced = input.images.is_some(),
            "Product updated"
        );

        self.store
            .find(&LookupTerm::Id(id))
            .await
            .map_err(|e| self.classifier.classify("update", e))?
            .map(ProductWithImages::into_flat)
            .ok_or_else(|| CoreError::not_found(ENTITY, "id", id.to_string()))
    }

    /// Delete the product resolved from `term`. Its images go with it.
    pub async fn remove(&self, term: &str) -> Result<String, CoreError> {
        let product = self.find_one(term).await?;
        let deleted = self
            .store
            .delete(product.product.id)
            .await
            .map_err(|e| self.classifier.classify("remove", e))?;

        if !deleted {
            return Err(CoreError::not_found(ENTITY, "term", term));
        }

        tracing::info!(id = %product.product.id, "Product deleted");
        Ok(format!("Product with id {term} deleted"))
    }

    /// Delete every product and image. Returns the number of products removed.
    pub async fn remove_all(&self) -> Result<u64, CoreError> {
        let removed = self
            .store
            .delete_all()
            .await
            .map_err(|e| self.classifier.classify("remove_all", e))?;
        tracing::info!(removed, "All products deleted");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Update helpers
    // -----------------------------------------------------------------------

    async fn write_update(
        &self,
        tx: &mut S::Tx,
        product: &Product,
        images: Option<&[String]>,
    ) -> Result<(), StoreError> {
        if let Some(urls) = images {
            self.store.delete_images(tx, product.id).await?;
            self.store.insert_images(tx, product.id, urls).await?;
        }
        self.store.save(tx, product).await?;
        Ok(())
    }

    /// Roll back after a failed step and classify the original failure.
    async fn abort(&self, tx: S::Tx, operation: &'static str, error: StoreError) -> CoreError {
        self.release(tx, operation).await;
        self.classifier.classify(operation, error)
    }

    /// Roll back `tx`. A rollback failure is logged and otherwise ignored.
    async fn release(&self, tx: S::Tx, operation: &'static str) {
        if let Err(err) = self.store.rollback(tx).await {
            tracing::error!(operation, error = %err, "Rollback failed");
        }
    }
}

fn validation_error(errors: ValidationErrors) -> CoreError {
    CoreError::Validation(errors.to_string())
}
