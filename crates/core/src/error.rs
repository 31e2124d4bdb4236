/// Message returned to callers for every failure that is not safe to describe.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected error, check server logs";

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with {key} {value} not found")]
    NotFound {
        entity: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Build a `NotFound` for a lookup that used the given key.
    pub fn not_found(entity: &'static str, key: &'static str, value: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            key,
            value: value.into(),
        }
    }

    /// The opaque error returned for anything the caller cannot act on.
    pub fn unexpected() -> Self {
        CoreError::Internal(UNEXPECTED_ERROR_MESSAGE.to_string())
    }

    /// Stable machine-readable code for the variant.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The message a caller is allowed to see.
    ///
    /// For `NotFound` this is the full "... not found" sentence; for the
    /// other variants it is the inner text without the variant prefix.
    pub fn public_message(&self) -> String {
        match self {
            CoreError::NotFound { .. } => self.to_string(),
            CoreError::Validation(msg) | CoreError::Conflict(msg) | CoreError::Internal(msg) => {
                msg.clone()
            }
        }
    }
}
