use sqlkit_core::SqlKitError;
use sqlkit_interchange::ImportError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors, split by whether the database was involved
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input rejected before any statement was sent
    #[error(transparent)]
    Validation(ImportError),

    #[error("Missing credential: {0}")]
    CredentialMissing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Driver or connection failure, unchanged
    #[error("Database error: {0}")]
    Store(#[source] SqlKitError),

    /// Store failure in the middle of an import; earlier rows stay committed
    #[error(transparent)]
    Import(ImportError),
}

impl ServiceError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }

    pub fn is_store(&self) -> bool {
        matches!(self, ServiceError::Store(_) | ServiceError::Import(_))
    }
}

impl From<SqlKitError> for ServiceError {
    fn from(err: SqlKitError) -> Self {
        match err {
            SqlKitError::CredentialMissing(msg) => ServiceError::CredentialMissing(msg),
            SqlKitError::Configuration(msg) => ServiceError::Configuration(msg),
            other => ServiceError::Store(other),
        }
    }
}

impl From<ImportError> for ServiceError {
    fn from(err: ImportError) -> Self {
        if err.is_validation() {
            ServiceError::Validation(err)
        } else {
            ServiceError::Import(err)
        }
    }
}
