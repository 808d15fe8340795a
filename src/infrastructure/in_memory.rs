use crate::domain::account::MainAccount;
use crate::domain::ports::LedgerStore;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory ledger store.
///
/// Keeps only the latest saved snapshot. Useful for tests and for runs where
/// durability is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    account: Arc<RwLock<Option<MainAccount>>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `account`, as if it had been saved earlier.
    pub fn with_account(account: MainAccount) -> Self {
        Self {
            account: Arc::new(RwLock::new(Some(account))),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn load(&self) -> Result<Option<MainAccount>> {
        Ok(self.account.read().await.clone())
    }

    async fn save(&self, account: MainAccount) -> Result<()> {
        *self.account.write().await = Some(account);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{Balance, Pocket};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_in_memory_store_starts_empty() {
        let store = InMemoryLedgerStore::new();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_store_keeps_latest() {
        let store = InMemoryLedgerStore::new();
        let mut account = MainAccount::default();
        account.total_balance = Balance::new(dec!(10));
        account.pockets.push(Pocket::new("p"));

        store.save(account.clone()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(account.clone()));

        account.available_balance = Balance::new(dec!(10));
        store.save(account.clone()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(account));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = InMemoryLedgerStore::new();
        let other = store.clone();
        store.save(MainAccount::default()).await.unwrap();
        assert!(other.load().await.unwrap().is_some());
    }
}
