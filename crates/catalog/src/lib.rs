//! Product catalog service.
//!
//! [`CatalogService`] implements the catalog operations over any
//! [`ProductStore`](storefront_db::store::ProductStore). Every store failure
//! passes through the [`ErrorClassifier`] before it reaches the caller.

pub mod classify;
pub mod config;
pub mod seed;
pub mod service;

pub use classify::{ErrorClassifier, ErrorSink, TracingErrorSink};
pub use service::CatalogService;
