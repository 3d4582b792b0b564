use thiserror::Error;

/// Failures raised by the storage backends before they cross a port as
/// `anyhow::Error`.
#[derive(Error, Debug)]
pub enum StorageError {
    #[cfg(feature = "db-sqlite")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "db-sqlite")]
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row that cannot be mapped back onto the domain model.
    #[error("corrupt {column} in row {row}: {reason}")]
    CorruptRow {
        row: String,
        column: &'static str,
        reason: String,
    },

    #[error("boulder not found with ID {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}
