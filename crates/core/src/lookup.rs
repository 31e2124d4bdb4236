//! Classification of a free-form lookup term.
//!
//! A product can be addressed either by its canonical id or by a
//! human-readable term that is matched against the title (case-insensitive)
//! or the slug (exact, after lower-casing the term).

use uuid::Uuid;

use crate::types::DbId;

/// Length of the canonical hyphenated UUID form (`8-4-4-4-12`).
const HYPHENATED_UUID_LEN: usize = 36;

/// How a lookup term will be matched against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTerm {
    /// The term is a canonical identifier; match `id` only.
    Id(DbId),
    /// Any other term; match `UPPER(title) = title` OR `slug = slug`.
    Text { title: String, slug: String },
}

impl LookupTerm {
    /// Classify `term`.
    ///
    /// Only the hyphenated 36-character UUID form counts as an identifier.
    /// Braced, URN, and bare 32-hex forms fall through to the text match.
    pub fn parse(term: &str) -> Self {
        match parse_canonical_id(term) {
            Some(id) => LookupTerm::Id(id),
            None => LookupTerm::Text {
                title: term.to_uppercase(),
                slug: term.to_lowercase(),
            },
        }
    }

    /// Whether a product with these fields satisfies the predicate.
    ///
    /// Used by stores that evaluate the predicate in process.
    pub fn matches(&self, id: DbId, title: &str, slug: &str) -> bool {
        match self {
            LookupTerm::Id(wanted) => *wanted == id,
            LookupTerm::Text {
                title: upper_title,
                slug: lower_slug,
            } => title.to_uppercase() == *upper_title || slug == lower_slug,
        }
    }
}

/// Parse `term` as a canonical hyphenated UUID.
pub fn parse_canonical_id(term: &str) -> Option<DbId> {
    if term.len() != HYPHENATED_UUID_LEN {
        return None;
    }
    Uuid::try_parse(term).ok()
}
