//! Integration tests for the product repository and the PostgreSQL store.
//!
//! Exercises the SQL layer against a real database:
//! - Create with images, lookup by id / title / slug
//! - Pagination order and window
//! - Unique constraint violations with their detail text
//! - Row-locked update with image replacement, commit and rollback
//! - Cascade delete of owned images

use sqlx::PgPool;
use storefront_core::lookup::LookupTerm;
use storefront_core::pagination::{PageRequest, PaginationParams};
use storefront_db::models::product::{CreateProduct, Gender, NewProduct, UpdateProduct};
use storefront_db::repositories::ProductRepo;
use storefront_db::store::{PgProductStore, ProductStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_product(title: &str) -> NewProduct {
    NewProduct::from_input(&CreateProduct {
        title: title.to_string(),
        price: Some(35.0),
        description: None,
        slug: None,
        stock: Some(3),
        sizes: vec!["S".into(), "M".into()],
        gender: Gender::Women,
        tags: vec!["shirt".into()],
        images: vec![],
    })
    .unwrap()
}

fn urls(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn image_count(pool: &PgPool) -> i64 {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM product_images")
        .fetch_one(pool)
        .await
        .unwrap();
    count.0
}

// ---------------------------------------------------------------------------
// Test: Create and lookup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_create_with_images_and_find_by_id(pool: PgPool) {
    let created = ProductRepo::create_with_images(
        &pool,
        &new_product("Women's Cropped Tee"),
        &urls(&["a.jpg", "b.jpg"]),
    )
    .await
    .unwrap();

    assert_eq!(created.product.slug, "womens_cropped_tee");
    assert_eq!(created.image_urls(), vec!["a.jpg", "b.jpg"]);

    let found = ProductRepo::find(&pool, &LookupTerm::Id(created.product.id))
        .await
        .unwrap()
        .expect("product should exist");
    assert_eq!(found.product.title, "Women's Cropped Tee");
    assert_eq!(found.image_urls(), vec!["a.jpg", "b.jpg"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_find_by_title_is_case_insensitive_and_slug_is_exact(pool: PgPool) {
    let created = ProductRepo::create_with_images(&pool, &new_product("Cyber Tee"), &[])
        .await
        .unwrap();

    let by_title = ProductRepo::find(&pool, &LookupTerm::parse("cYbEr TeE"))
        .await
        .unwrap();
    assert_eq!(by_title.map(|p| p.product.id), Some(created.product.id));

    let by_slug = ProductRepo::find(&pool, &LookupTerm::parse("CYBER_TEE"))
        .await
        .unwrap();
    assert_eq!(by_slug.map(|p| p.product.id), Some(created.product.id));

    let missing = ProductRepo::find(&pool, &LookupTerm::parse("cyber"))
        .await
        .unwrap();
    assert!(missing.is_none());
}

// ---------------------------------------------------------------------------
// Test: Pagination
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_list_window_follows_insertion_order(pool: PgPool) {
    for title in ["P1", "P2", "P3", "P4", "P5"] {
        ProductRepo::create_with_images(&pool, &new_product(title), &urls(&["x.jpg"]))
            .await
            .unwrap();
    }

    let page = ProductRepo::list(&pool, PageRequest { limit: 2, offset: 1 })
        .await
        .unwrap();
    let titles: Vec<&str> = page.iter().map(|p| p.product.title.as_str()).collect();
    assert_eq!(titles, vec!["P2", "P3"]);
    assert!(page.iter().all(|p| p.images.len() == 1));

    let past_end = ProductRepo::list(&pool, PaginationParams::new(None, Some(50)).resolve().unwrap())
        .await
        .unwrap();
    assert!(past_end.is_empty());
}

// ---------------------------------------------------------------------------
// Test: Unique constraints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_title_reports_detail(pool: PgPool) {
    let store = PgProductStore::new(pool.clone());
    store.insert(&new_product("Dup"), &[]).await.unwrap();

    let mut again = new_product("Dup");
    again.slug = "dup_other".to_string();
    let err = store.insert(&again, &urls(&["a.jpg"])).await.unwrap_err();

    assert!(err.is_unique_violation());
    assert_eq!(err.detail().as_deref(), Some("Key (title)=(Dup) already exists."));
    // The failed create left no orphan image behind.
    assert_eq!(image_count(&pool).await, 0);
}

// ---------------------------------------------------------------------------
// Test: Locked update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_update_replaces_images_on_commit(pool: PgPool) {
    let store = PgProductStore::new(pool.clone());
    let created = store
        .insert(&new_product("Hoodie"), &urls(&["old1.jpg", "old2.jpg"]))
        .await
        .unwrap();
    let id = created.product.id;

    let mut tx = store.begin().await.unwrap();
    let mut product = store.lock_for_update(&mut tx, id).await.unwrap().unwrap();
    product
        .apply_update(&UpdateProduct {
            price: Some(99.0),
            ..Default::default()
        })
        .unwrap();
    store.delete_images(&mut tx, id).await.unwrap();
    let saved = store.save(&mut tx, &product).await.unwrap();
    store
        .insert_images(&mut tx, id, &urls(&["new.jpg"]))
        .await
        .unwrap();
    store.commit(tx).await.unwrap();

    assert_eq!(saved.price, 99.0);
    assert!(saved.updated_at >= created.product.updated_at);

    let after = store.find(&LookupTerm::Id(id)).await.unwrap().unwrap();
    assert_eq!(after.image_urls(), vec!["new.jpg"]);
    assert_eq!(after.product.price, 99.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rollback_keeps_original_images(pool: PgPool) {
    let store = PgProductStore::new(pool.clone());
    let created = store
        .insert(&new_product("Beanie"), &urls(&["keep.jpg"]))
        .await
        .unwrap();
    let id = created.product.id;

    let mut tx = store.begin().await.unwrap();
    store.lock_for_update(&mut tx, id).await.unwrap().unwrap();
    store.delete_images(&mut tx, id).await.unwrap();
    store.rollback(tx).await.unwrap();

    let after = store.find(&LookupTerm::Id(id)).await.unwrap().unwrap();
    assert_eq!(after.image_urls(), vec!["keep.jpg"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lock_for_update_on_missing_row_is_none(pool: PgPool) {
    let store = PgProductStore::new(pool);
    let mut tx = store.begin().await.unwrap();
    let locked = store
        .lock_for_update(&mut tx, uuid::Uuid::now_v7())
        .await
        .unwrap();
    assert!(locked.is_none());
    store.rollback(tx).await.unwrap();
}

// ---------------------------------------------------------------------------
// Test: Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_cascades_to_images(pool: PgPool) {
    let created = ProductRepo::create_with_images(
        &pool,
        &new_product("Cap"),
        &urls(&["c1.jpg", "c2.jpg"]),
    )
    .await
    .unwrap();
    assert_eq!(image_count(&pool).await, 2);

    assert!(ProductRepo::delete(&pool, created.product.id).await.unwrap());
    assert_eq!(image_count(&pool).await, 0);
    assert!(!ProductRepo::delete(&pool, created.product.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_all_empties_both_tables(pool: PgPool) {
    for title in ["A", "B"] {
        ProductRepo::create_with_images(&pool, &new_product(title), &urls(&["i.jpg"]))
            .await
            .unwrap();
    }

    assert_eq!(ProductRepo::delete_all(&pool).await.unwrap(), 2);
    assert_eq!(image_count(&pool).await, 0);
    storefront_db::health_check(&pool).await.unwrap();
}
