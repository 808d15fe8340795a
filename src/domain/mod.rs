//! Domain layer: balances, pockets and the ledger state machine.
//!
//! Nothing in here knows about connections, wire formats or storage technology.

pub mod account;
pub mod ledger;
pub mod ports;
