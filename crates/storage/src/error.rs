use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }
}

/// Failures of the user-page domain services.
///
/// `Unauthorized`, `NotFound`, `InvalidUsername`, `WrongPassword` and
/// `InvalidInput` are meant for the end user. `Integrity` and `Storage` are
/// internal faults and must not be echoed back verbatim.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("You do not have permission to perform this operation")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid username")]
    InvalidUsername,

    #[error("Old password is incorrect")]
    WrongPassword,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;
