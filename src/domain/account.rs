use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Represents a monetary quantity held by the ledger.
///
/// Serialized as a JSON number so clients see plain balances (`1000.0`), while
/// arithmetic stays exact through `rust_decimal::Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Balance(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] pub Decimal);

/// A validated quantity of money moving between the main account and a pocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
pub struct Amount(Decimal);

impl Amount {
    /// Amount for deposits and withdrawals, which must move something.
    pub fn positive(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::invalid("Amount must be > 0"))
        }
    }

    /// Amount used to open a pocket; zero creates an empty pocket.
    pub fn non_negative(value: Decimal) -> Result<Self> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::invalid("Initial amount must be >= 0"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn covers(&self, amount: Amount) -> bool {
        self.0 >= amount.0
    }

    /// Adds `amount`, failing instead of overflowing the decimal range.
    pub fn checked_add(self, amount: Amount) -> Result<Self> {
        self.0
            .checked_add(amount.0)
            .map(Self)
            .ok_or_else(|| LedgerError::invalid("Amount exceeds supported range"))
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::iter::Sum for Balance {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// A named sub-balance funded from the main account.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Pocket {
    pub name: String,
    pub balance: Balance,
}

impl Pocket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            balance: Balance::ZERO,
        }
    }
}

/// The single top-level balance holder and its pockets, in creation order.
///
/// Values of this type handed out by the engine are snapshots: they own their
/// data and never alias live ledger state.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MainAccount {
    /// Money not allocated to any pocket.
    pub available_balance: Balance,
    /// Everything ever deposited at the account level, including the opening amount.
    pub total_balance: Balance,
    #[serde(default)]
    pub pockets: Vec<Pocket>,
}

impl MainAccount {
    pub fn new(initial_amount: Amount) -> Self {
        Self {
            available_balance: initial_amount.into(),
            total_balance: initial_amount.into(),
            pockets: Vec::new(),
        }
    }

    pub fn pocket(&self, name: &str) -> Option<&Pocket> {
        self.pockets.iter().find(|p| p.name == name)
    }

    /// Sum of every pocket balance.
    pub fn allocated(&self) -> Balance {
        self.pockets.iter().map(|p| p.balance).sum()
    }
}

/// A pocket together with the account state observed in the same critical section.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PocketSnapshot {
    pub name: String,
    pub balance: Balance,
    pub main_account: MainAccount,
}
