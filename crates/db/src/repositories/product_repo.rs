//! Repository for the `products` and `product_images` tables.

use sqlx::{FromRow, PgConnection, PgPool};
use storefront_core::lookup::LookupTerm;
use storefront_core::pagination::PageRequest;
use storefront_core::types::{DbId, ImageId};

use crate::models::product::{NewProduct, Product, ProductImage, ProductWithImages};

/// Column list for the `products` table.
const COLUMNS: &str = "id, title, slug, price, description, stock, sizes, gender, tags, \
    created_at, updated_at";

/// Column list for the `product_images` table.
const IMAGE_COLUMNS: &str = "id, url, product_id";

/// Product columns of the `selected` CTE plus the joined image columns.
const JOINED_COLUMNS: &str = "s.id, s.title, s.slug, s.price, s.description, s.stock, s.sizes, \
    s.gender, s.tags, s.created_at, s.updated_at, i.id AS image_id, i.url AS image_url";

/// Insertion order of products.
const PRODUCT_ORDER: &str = "created_at, id";

/// One row of a product LEFT JOIN product_images query.
#[derive(Debug, FromRow)]
struct JoinedRow {
    #[sqlx(flatten)]
    product: Product,
    image_id: Option<ImageId>,
    image_url: Option<String>,
}

/// Provides CRUD operations for products and their owned images.
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a product and its images in one transaction.
    pub async fn create_with_images(
        pool: &PgPool,
        input: &NewProduct,
        image_urls: &[String],
    ) -> Result<ProductWithImages, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let product = Self::insert(&mut tx, input).await?;
        let images = Self::insert_images(&mut tx, product.id, image_urls).await?;

        tx.commit().await?;
        Ok(ProductWithImages { product, images })
    }

    /// Find one product, with its images, matching a lookup term.
    ///
    /// When a text term matches several products the earliest inserted one
    /// is returned.
    pub async fn find(
        pool: &PgPool,
        term: &LookupTerm,
    ) -> Result<Option<ProductWithImages>, sqlx::Error> {
        let rows = match term {
            LookupTerm::Id(id) => {
                let query = Self::joined_query("SELECT {COLUMNS} FROM products WHERE id = $1");
                sqlx::query_as::<_, JoinedRow>(&query)
                    .bind(id)
                    .fetch_all(pool)
                    .await?
            }
            LookupTerm::Text { title, slug } => {
                let query = Self::joined_query(&format!(
                    "SELECT {{COLUMNS}} FROM products \
                     WHERE UPPER(title) = $1 OR slug = $2 \
                     ORDER BY {PRODUCT_ORDER} \
                     LIMIT 1"
                ));
                sqlx::query_as::<_, JoinedRow>(&query)
                    .bind(title)
                    .bind(slug)
                    .fetch_all(pool)
                    .await?
            }
        };
        Ok(fold_joined_rows(rows).into_iter().next())
    }

    /// List one page of products with their images, in insertion order.
    pub async fn list(
        pool: &PgPool,
        page: PageRequest,
    ) -> Result<Vec<ProductWithImages>, sqlx::Error> {
        let query = Self::joined_query(&format!(
            "SELECT {{COLUMNS}} FROM products \
             ORDER BY {PRODUCT_ORDER} \
             LIMIT $1 OFFSET $2"
        ));
        let rows = sqlx::query_as::<_, JoinedRow>(&query)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool)
            .await?;
        Ok(fold_joined_rows(rows))
    }

    /// Delete a product by ID. Its images go with it (`ON DELETE CASCADE`).
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every product (and, by cascade, every image).
    pub async fn delete_all(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products").execute(pool).await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Transaction-scoped helpers
    // -----------------------------------------------------------------------

    /// Insert the product row only.
    pub async fn insert(conn: &mut PgConnection, input: &NewProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products \
                (id, title, slug, price, description, stock, sizes, gender, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(input.id)
            .bind(&input.title)
            .bind(&input.slug)
            .bind(input.price)
            .bind(&input.description)
            .bind(input.stock)
            .bind(&input.sizes)
            .bind(input.gender)
            .bind(&input.tags)
            .fetch_one(&mut *conn)
            .await
    }

    /// Read a product and take a row lock on it until the transaction ends.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Write every scalar column of `product` back to its row.
    pub async fn save(conn: &mut PgConnection, product: &Product) -> Result<Product, sqlx::Error> {
        let query = format!(
            "UPDATE products SET \
                title = $2, \
                slug = $3, \
                price = $4, \
                description = $5, \
                stock = $6, \
                sizes = $7, \
                gender = $8, \
                tags = $9, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(product.id)
            .bind(&product.title)
            .bind(&product.slug)
            .bind(product.price)
            .bind(&product.description)
            .bind(product.stock)
            .bind(&product.sizes)
            .bind(product.gender)
            .bind(&product.tags)
            .fetch_one(&mut *conn)
            .await
    }

    /// Insert one image per URL, in order.
    pub async fn insert_images(
        conn: &mut PgConnection,
        product_id: DbId,
        urls: &[String],
    ) -> Result<Vec<ProductImage>, sqlx::Error> {
        let query = format!(
            "INSERT INTO product_images (url, product_id) VALUES ($1, $2) \
             RETURNING {IMAGE_COLUMNS}"
        );
        let mut images = Vec::with_capacity(urls.len());
        for url in urls {
            let image = sqlx::query_as::<_, ProductImage>(&query)
                .bind(url)
                .bind(product_id)
                .fetch_one(&mut *conn)
                .await?;
            images.push(image);
        }
        Ok(images)
    }

    /// Delete every image owned by a product.
    pub async fn delete_images(conn: &mut PgConnection, product_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM product_images WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Wrap a product selection in a CTE and LEFT JOIN its images onto it.
    ///
    /// `selection` may use the `{COLUMNS}` placeholder for the product
    /// column list.
    fn joined_query(selection: &str) -> String {
        let selection = selection.replace("{COLUMNS}", COLUMNS);
        format!(
            "WITH selected AS ({selection}) \
             SELECT {JOINED_COLUMNS} \
             FROM selected s \
             LEFT JOIN product_images i ON i.product_id = s.id \
             ORDER BY s.created_at, s.id, i.id"
        )
    }
}

/// Group joined rows (already ordered by product, then image id) into
/// aggregates. A product without images yields one row with NULL image
/// columns and ends up with an empty image list.
fn fold_joined_rows(rows: Vec<JoinedRow>) -> Vec<ProductWithImages> {
    let mut products: Vec<ProductWithImages> = Vec::new();

    for row in rows {
        let image = match (row.image_id, row.image_url) {
            (Some(id), Some(url)) => Some(ProductImage {
                id,
                url,
                product_id: row.product.id,
            }),
            _ => None,
        };

        match products.last_mut() {
            Some(current) if current.product.id == row.product.id => {
                current.images.extend(image);
            }
            _ => products.push(ProductWithImages {
                product: row.product,
                images: image.into_iter().collect(),
            }),
        }
    }

    products
}
