//! Application layer: the shared, concurrency-safe ledger engine.
//!
//! `LedgerEngine` serializes every operation through a single `tokio` mutex and
//! hands out snapshots. `Journal` forwards post-mutation snapshots to a
//! background task so persistence never runs inside the critical section.

pub mod engine;
pub mod journal;
