use crate::domain::account::Amount;
use crate::domain::ports::LedgerStoreRef;
use crate::error::{LedgerError, Result};
use crate::infrastructure::in_memory::InMemoryLedgerStore;
use crate::infrastructure::json_file::JsonFileStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_INITIAL_AMOUNT: Decimal = dec!(1000);

/// Where ledger snapshots are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageConfig {
    #[default]
    InMemory,
    JsonFile(PathBuf),
    RocksDB(PathBuf),
}

impl StorageConfig {
    pub fn from_paths(state_file: Option<PathBuf>, db_path: Option<PathBuf>) -> Result<Self> {
        match (state_file, db_path) {
            (None, None) => Ok(Self::InMemory),
            (Some(state_file), None) => Ok(Self::JsonFile(state_file)),
            (None, Some(db_path)) => Ok(Self::RocksDB(db_path)),
            (Some(_), Some(_)) => Err(LedgerError::invalid(
                "A state file and a database path cannot be used together",
            )),
        }
    }

    pub fn open(&self) -> Result<LedgerStoreRef> {
        match self {
            Self::InMemory => Ok(Arc::new(InMemoryLedgerStore::new())),
            Self::JsonFile(path) => Ok(Arc::new(JsonFileStore::new(path))),
            #[cfg(feature = "storage-rocksdb")]
            Self::RocksDB(path) => Ok(Arc::new(
                crate::infrastructure::rocksdb::RocksDBStore::open(path)?,
            )),
            #[cfg(not(feature = "storage-rocksdb"))]
            Self::RocksDB(path) => {
                tracing::warn!(
                    path = %path.display(),
                    "persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled; falling back to in-memory storage"
                );
                Ok(Arc::new(InMemoryLedgerStore::new()))
            }
        }
    }
}

/// Validated settings for one server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Opening balance of the main account when no saved state is restored.
    pub initial_amount: Decimal,
    pub storage: StorageConfig,
}

impl ServerConfig {
    pub fn new(
        host: IpAddr,
        port: u16,
        initial_amount: Decimal,
        storage: StorageConfig,
    ) -> Result<Self> {
        Amount::non_negative(initial_amount)?;
        Ok(Self {
            listen_addr: SocketAddr::new(host, port),
            initial_amount,
            storage,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            initial_amount: DEFAULT_INITIAL_AMOUNT,
            storage: StorageConfig::InMemory,
        }
    }
}
