use thiserror::Error;

/// Store failures, classified once at the adapter boundary.
///
/// The sync layer never inspects driver messages; it branches on these
/// variants only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A natural-key uniqueness constraint fired. The row the caller wanted
    /// already exists.
    #[error("unique constraint {constraint} already satisfied")]
    ConflictBenign { constraint: String },

    /// The surrogate-key counter of `table` handed out an id that is
    /// already taken.
    #[error("surrogate key sequence out of sync on {table}")]
    ConflictSurrogateKey { table: String },

    #[error("store operation '{operation}' timed out")]
    Timeout { operation: &'static str },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    pub fn other(message: impl Into<String>) -> Self {
        StoreError::Other(message.into())
    }

    pub fn is_surrogate_conflict(&self) -> bool {
        matches!(self, StoreError::ConflictSurrogateKey { .. })
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Caller-facing failure of a single import.
///
/// Only these reach the caller; every per-item problem is folded into the
/// import summary instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{0}")]
    NotFoundUpstream(String),

    #[error("invalid import request: {0}")]
    Validation(String),

    #[error("failed to write content record: {0}")]
    MainWrite(#[source] StoreError),

    #[error("import failed: {0}")]
    Internal(String),
}

impl ImportError {
    /// Whether a bulk run should try the same reference again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ImportError::MainWrite(_) | ImportError::Internal(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            ImportError::NotFoundUpstream(_) => "not_found_upstream",
            ImportError::Validation(_) => "validation",
            ImportError::MainWrite(_) => "main_write",
            ImportError::Internal(_) => "internal",
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
