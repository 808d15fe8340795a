use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Insufficient funds in main account")]
    InsufficientAccountFunds,
    #[error("Insufficient funds in pocket")]
    InsufficientPocketFunds,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Errors the client caused and can correct; their message is safe to send back verbatim.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::NotFound(_)
                | Self::InsufficientAccountFunds
                | Self::InsufficientPocketFunds
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
