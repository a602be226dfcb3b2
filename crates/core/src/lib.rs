//! Core business logic for StackIt.
//!
//! The voting ledger and the acceptance coordinator hold the only
//! multi-statement invariants; both run as single store transactions and
//! push notifications only after commit.

pub mod services;

pub use services::*;
