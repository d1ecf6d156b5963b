//! Core types for the star ledger.
//!
//! This crate provides the foundational types shared by the ledger and its
//! storage layer:
//!
//! - **Identifiers**: `UserId`, `TransactionId`
//! - **Rows**: `LedgerRow`, `PoolSnapshot`
//! - **Balances**: `CreditBalance`, `DeductReceipt`, `ExpiredStars`
//! - **Transactions**: `CreditTransaction`, `TransactionKind`
//!
//! # Star Unit
//!
//! **1 star = 1 generation credit.** Balances are stored as `i64` whole
//! stars; there are no fractional credits.
//!
//! A user's balance is split into two pools:
//!
//! - **Subscription stars** come from a recurring subscription payment and
//!   expire at the end of the billing period.
//! - **Package stars** come from one-time purchases and never expire.
//!
//! Deductions always spend the subscription pool first, since it is the one
//! that can be lost to expiry.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod balance;
pub mod ids;
pub mod row;
pub mod transaction;

pub use balance::{CreditBalance, DeductReceipt, ExpiredStars};
pub use ids::{IdError, TransactionId, UserId};
pub use row::{LedgerRow, PoolSnapshot};
pub use transaction::{CreditTransaction, TransactionKind};
