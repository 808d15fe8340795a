use super::account::{Amount, Balance, MainAccount, Pocket, PocketSnapshot};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// The main account and its pockets, with every state transition as a single
/// validate-then-mutate step.
///
/// `Ledger` does no locking of its own. Callers that share it must hold exclusive
/// access for the whole duration of each call (see `application::engine`).
///
/// Every transition preserves `available + Σ pockets = total` and keeps all
/// balances non-negative. A failed transition leaves the ledger untouched.
#[derive(Debug, Clone)]
pub struct Ledger {
    account: MainAccount,
    /// Pocket name -> position in `account.pockets`.
    index: HashMap<String, usize>,
}

impl Ledger {
    pub fn new(initial_amount: Amount) -> Self {
        Self {
            account: MainAccount::new(initial_amount),
            index: HashMap::new(),
        }
    }

    /// Rebuilds a ledger from previously saved state, rejecting records that break
    /// the balance invariants.
    pub fn restore(account: MainAccount) -> Result<Self> {
        if account.available_balance < Balance::ZERO {
            return Err(LedgerError::invalid(
                "Stored available balance is negative",
            ));
        }
        if account.available_balance > account.total_balance {
            return Err(LedgerError::invalid(
                "Stored available balance exceeds total balance",
            ));
        }

        let mut index = HashMap::with_capacity(account.pockets.len());
        for (position, pocket) in account.pockets.iter().enumerate() {
            if pocket.name.trim().is_empty() {
                return Err(LedgerError::invalid("Stored pocket has a blank name"));
            }
            if pocket.balance < Balance::ZERO {
                return Err(LedgerError::invalid(format!(
                    "Stored pocket {} has a negative balance",
                    pocket.name
                )));
            }
            if index.insert(pocket.name.clone(), position).is_some() {
                return Err(LedgerError::invalid(format!(
                    "Stored pocket {} appears more than once",
                    pocket.name
                )));
            }
        }

        if account.available_balance + account.allocated() != account.total_balance {
            return Err(LedgerError::invalid(
                "Stored pocket balances do not add up to total balance",
            ));
        }

        Ok(Self { account, index })
    }

    /// Moves `initial_amount` from the available balance into the pocket `name`,
    /// creating the pocket first if it does not exist yet.
    pub fn add_pocket(&mut self, name: &str, initial_amount: Decimal) -> Result<PocketSnapshot> {
        if name.trim().is_empty() {
            return Err(LedgerError::invalid("Pocket name is required"));
        }
        let amount = Amount::non_negative(initial_amount)?;
        if !self.account.available_balance.covers(amount) {
            return Err(LedgerError::InsufficientAccountFunds);
        }

        let position = match self.index.get(name) {
            Some(&position) => position,
            None => {
                let position = self.account.pockets.len();
                self.account.pockets.push(Pocket::new(name));
                self.index.insert(name.to_string(), position);
                position
            }
        };

        self.move_into_pocket(position, amount)
    }

    pub fn deposit_to_pocket(&mut self, name: &str, amount: Decimal) -> Result<PocketSnapshot> {
        let amount = Amount::positive(amount)?;
        let position = self.position(name)?;
        if !self.account.available_balance.covers(amount) {
            return Err(LedgerError::InsufficientAccountFunds);
        }

        self.move_into_pocket(position, amount)
    }

    pub fn withdraw_from_pocket(&mut self, name: &str, amount: Decimal) -> Result<PocketSnapshot> {
        let amount = Amount::positive(amount)?;
        let position = self.position(name)?;
        if !self.account.pockets[position].balance.covers(amount) {
            return Err(LedgerError::InsufficientPocketFunds);
        }

        let available = self.account.available_balance.checked_add(amount)?;
        self.account.pockets[position].balance -= Balance::from(amount);
        self.account.available_balance = available;

        Ok(self.pocket_snapshot(position))
    }

    pub fn deposit_to_account(&mut self, amount: Decimal) -> Result<MainAccount> {
        let amount = Amount::positive(amount)?;
        let available = self.account.available_balance.checked_add(amount)?;
        let total = self.account.total_balance.checked_add(amount)?;

        self.account.available_balance = available;
        self.account.total_balance = total;

        Ok(self.snapshot())
    }

    pub fn pocket(&self, name: &str) -> Result<PocketSnapshot> {
        let position = self.position(name)?;
        Ok(self.pocket_snapshot(position))
    }

    /// Independent copy of the account and all pockets.
    pub fn snapshot(&self) -> MainAccount {
        self.account.clone()
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| LedgerError::NotFound(format!("Pocket not found: {}", name)))
    }

    fn move_into_pocket(&mut self, position: usize, amount: Amount) -> Result<PocketSnapshot> {
        let balance = self.account.pockets[position].balance.checked_add(amount)?;
        self.account.pockets[position].balance = balance;
        self.account.available_balance -= Balance::from(amount);

        Ok(self.pocket_snapshot(position))
    }

    fn pocket_snapshot(&self, position: usize) -> PocketSnapshot {
        let pocket = &self.account.pockets[position];
        PocketSnapshot {
            name: pocket.name.clone(),
            balance: pocket.balance,
            main_account: self.snapshot(),
        }
    }
}
