use super::journal::{Journal, JournalTask};
use crate::domain::account::{Amount, MainAccount, PocketSnapshot};
use crate::domain::ledger::Ledger;
use crate::domain::ports::LedgerStoreRef;
use crate::error::Result;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

/// The shared ledger behind the request server.
///
/// All operations, reads included, run under one mutex held for the whole
/// validate-then-mutate step, so they behave as if executed one at a time in
/// some total order. Nothing inside the critical section awaits I/O.
///
/// Results are owned snapshots; holding one never blocks or observes later
/// operations.
pub struct LedgerEngine {
    ledger: Mutex<Ledger>,
    journal: Option<Journal>,
}

impl LedgerEngine {
    /// Creates an engine whose main account starts with `initial_amount`
    /// available and total.
    pub fn new(initial_amount: Decimal) -> Result<Self> {
        let initial_amount = Amount::non_negative(initial_amount)?;
        Ok(Self::from_ledger(Ledger::new(initial_amount)))
    }

    /// Creates an engine from previously saved state.
    pub fn restore(account: MainAccount) -> Result<Self> {
        Ok(Self::from_ledger(Ledger::restore(account)?))
    }

    /// Restores from `store` when it holds saved state, otherwise starts fresh
    /// with `initial_amount`.
    pub async fn load_or_new(store: &LedgerStoreRef, initial_amount: Decimal) -> Result<Self> {
        match store.load().await? {
            Some(account) => {
                tracing::info!(
                    pockets = account.pockets.len(),
                    available = %account.available_balance.value(),
                    total = %account.total_balance.value(),
                    "restored ledger from store"
                );
                Self::restore(account)
            }
            None => Self::new(initial_amount),
        }
    }

    fn from_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            journal: None,
        }
    }

    /// Publishes a snapshot to `journal` after every successful mutation.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub async fn add_pocket(&self, name: &str, initial_amount: Decimal) -> Result<PocketSnapshot> {
        let mut ledger = self.ledger.lock().await;
        let snapshot = ledger.add_pocket(name, initial_amount)?;
        self.publish(&snapshot.main_account);
        Ok(snapshot)
    }

    pub async fn deposit_to_pocket(&self, name: &str, amount: Decimal) -> Result<PocketSnapshot> {
        let mut ledger = self.ledger.lock().await;
        let snapshot = ledger.deposit_to_pocket(name, amount)?;
        self.publish(&snapshot.main_account);
        Ok(snapshot)
    }

    pub async fn withdraw_from_pocket(
        &self,
        name: &str,
        amount: Decimal,
    ) -> Result<PocketSnapshot> {
        let mut ledger = self.ledger.lock().await;
        let snapshot = ledger.withdraw_from_pocket(name, amount)?;
        self.publish(&snapshot.main_account);
        Ok(snapshot)
    }

    pub async fn deposit_to_account(&self, amount: Decimal) -> Result<MainAccount> {
        let mut ledger = self.ledger.lock().await;
        let snapshot = ledger.deposit_to_account(amount)?;
        self.publish(&snapshot);
        Ok(snapshot)
    }

    pub async fn pocket(&self, name: &str) -> Result<PocketSnapshot> {
        self.ledger.lock().await.pocket(name)
    }

    pub async fn account(&self) -> MainAccount {
        self.ledger.lock().await.snapshot()
    }

    /// Stops `journal` once its queue is saved, then writes the current state
    /// straight to `store`. Later mutations are not persisted.
    pub async fn persist_final(
        &self,
        journal: JournalTask,
        store: &LedgerStoreRef,
    ) -> Result<MainAccount> {
        journal.close().await;
        let account = self.account().await;
        store.save(account.clone()).await?;
        Ok(account)
    }

    // Called with the ledger lock held so journal order matches mutation order.
    fn publish(&self, account: &MainAccount) {
        if let Some(journal) = &self.journal {
            journal.record(account.clone());
        }
    }
}
