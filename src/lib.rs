//! In-memory pocket ledger served over newline-delimited JSON.
//!
//! A single main account holds available and total balances. Clients create
//! named pockets and move money between them and the main account; every
//! operation goes through [`application::engine::LedgerEngine`], which keeps the
//! balances consistent under any number of concurrent connections.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
