//! Product slug normalization.

use crate::error::CoreError;

/// Normalize a slug source (a supplied slug or the product title).
///
/// - Lower-cases the input.
/// - Replaces every whitespace character with `_` (no collapsing).
/// - Removes apostrophes (`'` and `’`).
///
/// # Examples
///
/// ```
/// use storefront_core::slug::normalize_slug;
///
/// assert_eq!(normalize_slug("Men's Chill Crew Neck"), "mens_chill_crew_neck");
/// assert_eq!(normalize_slug("already_a_slug"), "already_a_slug");
/// ```
pub fn normalize_slug(source: &str) -> String {
    source
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Normalize `source` and reject it if nothing is left, e.g. a source
/// made only of apostrophes.
pub fn checked_slug(source: &str) -> Result<String, CoreError> {
    let slug = normalize_slug(source);
    if slug.is_empty() {
        return Err(CoreError::Validation(format!(
            "slug must not be empty after normalization, got {source:?}"
        )));
    }
    Ok(slug)
}

/// Slug for a new product: the supplied slug if any, otherwise the title.
pub fn slug_for_new_product(title: &str, slug: Option<&str>) -> Result<String, CoreError> {
    checked_slug(slug.unwrap_or(title))
}
