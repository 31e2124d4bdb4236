//! Low-level store failures.
//!
//! Both store implementations report failures through [`StoreError`] and
//! speak PostgreSQL SQLSTATE codes, so the classifier in the service layer
//! has a single vocabulary to inspect.

use sqlx::postgres::PgDatabaseError;

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for `internal_error`; used by the in-memory store for faults.
pub const INTERNAL_ERROR: &str = "XX000";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A failure reported by sqlx (PostgreSQL store).
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A failure reported by the in-memory store.
    #[error("{message}")]
    Memory {
        code: &'static str,
        message: String,
        detail: Option<String>,
    },
}

impl StoreError {
    /// Build the in-memory equivalent of a PostgreSQL unique violation.
    pub fn unique_violation(constraint: &str, column: &str, value: &str) -> Self {
        StoreError::Memory {
            code: UNIQUE_VIOLATION,
            message: format!("duplicate key value violates unique constraint \"{constraint}\""),
            detail: Some(format!("Key ({column})=({value}) already exists.")),
        }
    }

    /// Build an in-memory fault with SQLSTATE `XX000`.
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Memory {
            code: INTERNAL_ERROR,
            message: message.into(),
            detail: None,
        }
    }

    /// The SQLSTATE code, when the failure came from the database engine.
    pub fn code(&self) -> Option<String> {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().map(|code| code.into_owned())
            }
            StoreError::Database(_) => None,
            StoreError::Memory { code, .. } => Some((*code).to_string()),
        }
    }

    /// The engine's human-readable detail line, e.g.
    /// `Key (title)=(Tee) already exists.`
    pub fn detail(&self) -> Option<String> {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => db_err
                .try_downcast_ref::<PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .map(str::to_string),
            StoreError::Database(_) => None,
            StoreError::Memory { detail, .. } => detail.clone(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.code().as_deref() == Some(UNIQUE_VIOLATION)
    }
}
