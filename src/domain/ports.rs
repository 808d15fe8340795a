use super::account::MainAccount;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable home for ledger state.
///
/// The ledger never calls a store from inside its critical section; saves are fed
/// from the journal in mutation order.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Returns the last saved account, or `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<MainAccount>>;
    async fn save(&self, account: MainAccount) -> Result<()>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
