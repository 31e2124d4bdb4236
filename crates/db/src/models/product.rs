//! Product entity model, its owned images, and DTOs.
//!
//! A product exclusively owns its images: an image row never outlives its
//! product and is never shared between products. Image order is the order
//! of image ids within a product.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::error::CoreError;
use storefront_core::slug::{checked_slug, slug_for_new_product};
use storefront_core::types::{DbId, ImageId, Timestamp};
use uuid::Uuid;
use validator::Validate;

/// Target audience of a product. Maps to the `product_gender` enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Men,
    Women,
    Kid,
    Unisex,
}

/// A row from the `products` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub price: f64,
    pub description: Option<String>,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub gender: Gender,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Product {
    /// Merge the present fields of `patch` onto this row.
    ///
    /// Absent fields are left untouched. A supplied slug is normalized the
    /// same way as on create; if it normalizes to nothing the row is left
    /// unchanged and a validation error is returned. `patch.images` is not
    /// looked at here; image replacement is a separate step of the update
    /// protocol.
    pub fn apply_update(&mut self, patch: &UpdateProduct) -> Result<(), CoreError> {
        let slug = patch.slug.as_deref().map(checked_slug).transpose()?;

        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(slug) = slug {
            self.slug = slug;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if let Some(sizes) = &patch.sizes {
            self.sizes = sizes.clone();
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        Ok(())
    }
}

/// A row from the `product_images` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ProductImage {
    pub id: ImageId,
    pub url: String,
    pub product_id: DbId,
}

/// A product with its image records, ordered by image id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductWithImages {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
}

impl ProductWithImages {
    /// Image URLs in image order.
    pub fn image_urls(&self) -> Vec<String> {
        self.images.iter().map(|image| image.url.clone()).collect()
    }

    /// Replace the image records by their URLs.
    pub fn into_flat(self) -> FlatProduct {
        FlatProduct {
            product: self.product,
            images: self.images.into_iter().map(|image| image.url).collect(),
        }
    }
}

/// A product whose images are plain URL strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatProduct {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<String>,
}

/// DTO for creating a new product together with its images.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    /// Defaults to 0 if omitted.
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
    pub description: Option<String>,
    /// Derived from `title` if omitted.
    #[validate(length(min = 1, message = "slug must not be empty"))]
    pub slug: Option<String>,
    /// Defaults to 0 if omitted.
    #[validate(range(min = 0, message = "stock must not be negative"))]
    pub stock: Option<i32>,
    pub sizes: Vec<String>,
    pub gender: Gender,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image URLs in display order.
    #[serde(default)]
    pub images: Vec<String>,
}

/// DTO for updating an existing product. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: Option<f64>,
    pub description: Option<String>,
    #[validate(length(min = 1, message = "slug must not be empty"))]
    pub slug: Option<String>,
    #[validate(range(min = 0, message = "stock must not be negative"))]
    pub stock: Option<i32>,
    pub sizes: Option<Vec<String>>,
    pub gender: Option<Gender>,
    pub tags: Option<Vec<String>>,
    /// If `Some`, replaces all images. If `None`, leaves them unchanged.
    pub images: Option<Vec<String>>,
}

/// A fully resolved product ready to be inserted.
///
/// The id is assigned here, not by the database, so stores share one id
/// scheme.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub price: f64,
    pub description: Option<String>,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub gender: Gender,
    pub tags: Vec<String>,
}

impl NewProduct {
    /// Resolve defaults and the slug for `input`.
    ///
    /// Fails if the slug (supplied, or derived from the title) normalizes
    /// to an empty string.
    pub fn from_input(input: &CreateProduct) -> Result<Self, CoreError> {
        Ok(Self {
            id: Uuid::now_v7(),
            title: input.title.clone(),
            slug: slug_for_new_product(&input.title, input.slug.as_deref())?,
            price: input.price.unwrap_or(0.0),
            description: input.description.clone(),
            stock: input.stock.unwrap_or(0),
            sizes: input.sizes.clone(),
            gender: input.gender,
            tags: input.tags.clone(),
        })
    }
}
