//! Domain building blocks shared by the storefront crates.
//!
//! Nothing in here touches the database; the modules hold the id and time
//! types, the error taxonomy, and the pure helpers (lookup-term parsing,
//! slug normalization, pagination bounds) the store and catalog layers
//! build on.

pub mod error;
pub mod lookup;
pub mod pagination;
pub mod slug;
pub mod types;
