use crate::domain::account::{Balance, MainAccount, Pocket};
use crate::domain::ports::LedgerStore;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding the main account balances.
pub const CF_ACCOUNT: &str = "account";
/// Column Family holding one record per pocket.
pub const CF_POCKETS: &str = "pockets";

const ACCOUNT_KEY: &[u8] = b"main";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountRecord {
    available_balance: Balance,
    total_balance: Balance,
}

/// A persistent store implementation using RocksDB.
///
/// Account balances and pockets live in separate Column Families. Pockets are
/// keyed by their big-endian creation index, so iterating the family yields them
/// in creation order.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("account" and "pockets") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_account = ColumnFamilyDescriptor::new(CF_ACCOUNT, Options::default());
        let cf_pockets = ColumnFamilyDescriptor::new(CF_POCKETS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_account, cf_pockets])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::StorageError(format!("{} column family not found", name)))
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn load(&self) -> Result<Option<MainAccount>> {
        let Some(bytes) = self.db.get_cf(self.cf(CF_ACCOUNT)?, ACCOUNT_KEY)? else {
            return Ok(None);
        };
        let record: AccountRecord = serde_json::from_slice(&bytes)
            .map_err(|e| LedgerError::StorageError(format!("Deserialization error: {}", e)))?;

        let mut pockets = Vec::new();
        for item in self.db.iterator_cf(self.cf(CF_POCKETS)?, IteratorMode::Start) {
            let (_key, value) = item?;
            let pocket: Pocket = serde_json::from_slice(&value).map_err(|e| {
                LedgerError::StorageError(format!("Failed to deserialize pocket: {}", e))
            })?;
            pockets.push(pocket);
        }

        Ok(Some(MainAccount {
            available_balance: record.available_balance,
            total_balance: record.total_balance,
            pockets,
        }))
    }

    async fn save(&self, account: MainAccount) -> Result<()> {
        let serialization_error =
            |e: serde_json::Error| LedgerError::StorageError(format!("Serialization error: {}", e));

        let record = AccountRecord {
            available_balance: account.available_balance,
            total_balance: account.total_balance,
        };

        // One batch, so a reader never sees balances from one snapshot and pockets from another.
        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_ACCOUNT)?,
            ACCOUNT_KEY,
            serde_json::to_vec(&record).map_err(serialization_error)?,
        );
        let pockets_cf = self.cf(CF_POCKETS)?;
        for (position, pocket) in account.pockets.iter().enumerate() {
            let key = (position as u32).to_be_bytes();
            batch.put_cf(
                pockets_cf,
                key,
                serde_json::to_vec(pocket).map_err(serialization_error)?,
            );
        }

        self.db.write(batch)?;
        Ok(())
    }
}
