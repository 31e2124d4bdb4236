//! Fixed starter catalog.

use storefront_core::error::CoreError;
use storefront_db::models::product::{CreateProduct, Gender};
use storefront_db::store::ProductStore;

use crate::service::CatalogService;

/// Returned by [`CatalogService::run_seed`] on success.
pub const SEED_EXECUTED: &str = "SEED EXECUTED";

fn product(
    title: &str,
    price: f64,
    stock: i32,
    sizes: &[&str],
    gender: Gender,
    tags: &[&str],
    images: &[&str],
) -> CreateProduct {
    CreateProduct {
        title: title.to_string(),
        price: Some(price),
        description: Some(format!("{title}, part of the starter collection.")),
        slug: None,
        stock: Some(stock),
        sizes: sizes.iter().map(|s| s.to_string()).collect(),
        gender,
        tags: tags.iter().map(|s| s.to_string()).collect(),
        images: images.iter().map(|s| s.to_string()).collect(),
    }
}

/// The seed products, in insertion order.
pub fn seed_products() -> Vec<CreateProduct> {
    vec![
        product(
            "Men's Chill Crew Neck Sweatshirt",
            75.0,
            7,
            &["XS", "S", "M", "L", "XL", "XXL"],
            Gender::Men,
            &["sweatshirt"],
            &["1740176-00-A_0_2000.jpg", "1740176-00-A_1.jpg"],
        ),
        product(
            "Men's Quilted Shirt Jacket",
            200.0,
            5,
            &["XS", "S", "M", "XL", "XXL"],
            Gender::Men,
            &["jacket"],
            &["1740507-00-A_0_2000.jpg", "1740507-00-A_1.jpg"],
        ),
        product(
            "Men's Raven Lightweight Zip Up Bomber Jacket",
            130.0,
            10,
            &["S", "M", "L", "XL", "XXL"],
            Gender::Men,
            &["shirt"],
            &["1740250-00-A_0_2000.jpg", "1740250-00-A_1.jpg"],
        ),
        product(
            "Women's Cropped Puffer Jacket",
            225.0,
            85,
            &["XS", "S", "M"],
            Gender::Women,
            &["hoodie"],
            &["1740535-00-A_0_2000.jpg", "1740535-00-A_1.jpg"],
        ),
        product(
            "Women's Raven Slouchy Crew Sweatshirt",
            110.0,
            9,
            &["XS", "S", "M", "L", "XL", "XXL"],
            Gender::Women,
            &["hoodie"],
            &["1740264-00-A_0_2000.jpg", "1740264-00-A_1.jpg"],
        ),
        product(
            "Kids Cybertruck Long Sleeve Tee",
            30.0,
            10,
            &["XS", "S", "M"],
            Gender::Kid,
            &["shirt"],
            &["1742694-00-A_1_2000.jpg", "1742694-00-A_3.jpg"],
        ),
        product(
            "Kids Scribble T Logo Tee",
            25.0,
            0,
            &["XS", "S", "M"],
            Gender::Kid,
            &["shirt"],
            &["8529312-00-A_0_2000.jpg", "8529312-00-A_1.jpg"],
        ),
        product(
            "Made on Earth by Humans Onesie",
            30.0,
            16,
            &["XS", "S"],
            Gender::Kid,
            &["shirt"],
            &["1473834-00-A_2_2000.jpg", "1473829-00-A_2_2000.jpg"],
        ),
        product(
            "Chill Pullover Hoodie",
            90.0,
            12,
            &["XS", "S", "M", "L", "XL"],
            Gender::Unisex,
            &["hoodie"],
            &["1740051-00-A_0_2000.jpg", "1740051-00-A_1.jpg"],
        ),
    ]
}

impl<S: ProductStore> CatalogService<S> {
    /// Replace the whole catalog with [`seed_products`].
    ///
    /// Existing products are removed first. Seed products are created one
    /// at a time so their insertion order matches the seed list.
    pub async fn run_seed(&self) -> Result<&'static str, CoreError> {
        let removed = self.remove_all().await?;

        let products = seed_products();
        let count = products.len();
        for input in products {
            self.create(input).await?;
        }

        tracing::info!(removed, created = count, "Seed executed");
        Ok(SEED_EXECUTED)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use storefront_core::slug::slug_for_new_product;
    use validator::Validate;

    use super::*;

    #[test]
    fn seed_products_are_valid() {
        for input in seed_products() {
            assert!(input.validate().is_ok(), "{} failed validation", input.title);
            assert!(!input.images.is_empty());
        }
    }

    #[test]
    fn seed_titles_and_slugs_are_unique() {
        let products = seed_products();
        let titles: HashSet<&str> = products.iter().map(|p| p.title.as_str()).collect();
        let slugs: HashSet<String> = products
            .iter()
            .map(|p| slug_for_new_product(&p.title, p.slug.as_deref()).unwrap())
            .collect();
        assert_eq!(titles.len(), products.len());
        assert_eq!(slugs.len(), products.len());
    }
}
