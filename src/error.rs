/// Error types for transaction scoping
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error from SQLx
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Savepoint nesting mode was changed while a transaction is open
    #[error("savepoint nesting cannot be changed while a transaction is open")]
    AlreadyInTransaction,

    /// Commit or rollback was requested with no open transaction
    #[error("no open transaction to resolve")]
    NotInTransaction,
}

/// Result type alias for transaction operations
pub type Result<T> = std::result::Result<T, Error>;
