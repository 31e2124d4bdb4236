//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods.
//! Pool-level methods take `&PgPool`; transaction-scoped helpers take
//! `&mut PgConnection` so callers can run them inside their own transaction.

pub mod product_repo;

pub use product_repo::ProductRepo;
