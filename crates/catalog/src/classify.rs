//! Translation of store failures into caller-facing errors.
//!
//! Unique violations are safe to describe and become
//! [`CoreError::Conflict`] carrying the store's detail line. Everything else
//! is reported in full to an [`ErrorSink`] and replaced by the opaque
//! [`CoreError::unexpected`] error.

use std::sync::Arc;

use storefront_core::error::CoreError;
use storefront_db::StoreError;

/// Receives the full detail of failures that are hidden from callers.
pub trait ErrorSink: Send + Sync {
    fn report(&self, operation: &'static str, error: &StoreError);
}

/// Emits each reported failure as a `tracing` error event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, operation: &'static str, error: &StoreError) {
        let code = error.code().unwrap_or_default();
        let detail = error.detail().unwrap_or_default();
        tracing::error!(
            operation,
            error = %error,
            code = %code,
            detail = %detail,
            "Unexpected store error"
        );
    }
}

#[derive(Clone)]
pub struct ErrorClassifier {
    sink: Arc<dyn ErrorSink>,
}

impl std::fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorClassifier").finish_non_exhaustive()
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(Arc::new(TracingErrorSink))
    }
}

impl ErrorClassifier {
    pub fn new(sink: Arc<dyn ErrorSink>) -> Self {
        Self { sink }
    }

    /// Classify a store failure raised while running `operation`.
    ///
    /// - SQLSTATE `23505` maps to `Conflict(detail)`, falling back to the
    ///   store message when the engine gave no detail.
    /// - Anything else is reported to the sink and mapped to the generic
    ///   internal error.
    pub fn classify(&self, operation: &'static str, error: StoreError) -> CoreError {
        if error.is_unique_violation() {
            let message = error.detail().unwrap_or_else(|| error.to_string());
            tracing::debug!(operation, %message, "Unique constraint violated");
            return CoreError::Conflict(message);
        }

        self.sink.report(operation, &error);
        CoreError::unexpected()
    }
}
