//! Storage layer for the star ledger.
//!
//! This crate provides persistent storage for ledger rows and credit
//! transactions. Two implementations of the [`LedgerStore`] trait ship here:
//!
//! - [`RocksStore`]: `RocksDB` with column families, the bundled backend.
//! - [`MemoryStore`]: a `HashMap` behind a mutex, for tests.
//!
//! # Conditional updates
//!
//! The ledger never locks in-process; lost updates are prevented entirely by
//! [`LedgerStore::compare_and_update`], which commits only if the row still
//! carries the counter values the caller read. Any backend with an atomic
//! "update where columns equal" primitive (a relational `UPDATE … WHERE`, a
//! document-store filtered update) satisfies the contract.
//!
//! # Example
//!
//! ```no_run
//! use star_ledger_store::{LedgerStore, RocksStore};
//! use star_ledger_core::{LedgerRow, UserId};
//!
//! let store = RocksStore::open("/tmp/star-ledger-db").unwrap();
//!
//! let user_id = UserId::generate();
//! let row = store
//!     .insert_row_if_absent(&LedgerRow::new(user_id))
//!     .unwrap();
//!
//! // Conditionally move 10 stars into the package pool.
//! let updated = store
//!     .compare_and_update(&user_id, &row.snapshot(), row.subscription_stars, 10)
//!     .unwrap();
//! assert!(updated.is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use rocks::RocksStore;

use star_ledger_core::{CreditTransaction, LedgerRow, PoolSnapshot, UserId};

/// The storage trait defining all ledger database operations.
pub trait LedgerStore: Send + Sync {
    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Get the ledger row for a user, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_row(&self, user_id: &UserId) -> Result<Option<LedgerRow>>;

    /// Insert a row unless one already exists for the user.
    ///
    /// Returns the row that is present after the call: the existing row if
    /// there was one (never overwritten), otherwise the inserted row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_row_if_absent(&self, row: &LedgerRow) -> Result<LedgerRow>;

    /// Write a row unconditionally (insert or replace).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_row(&self, row: &LedgerRow) -> Result<()>;

    /// Conditionally replace a user's pool counters.
    ///
    /// The write commits only if the stored row still matches `expected` on
    /// all three counters. On commit the legacy mirror is set to the new pool
    /// sum and `updated_at` is refreshed; the post-write row is returned.
    /// Returns `Ok(None)` if the row is absent or a concurrent writer got
    /// there first; the caller decides whether to retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn compare_and_update(
        &self,
        user_id: &UserId,
        expected: &PoolSnapshot,
        subscription_stars: i64,
        package_stars: i64,
    ) -> Result<Option<LedgerRow>>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Append a credit transaction to the audit log.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_transaction(&self, transaction: &CreditTransaction) -> Result<()>;

    /// List transactions for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>>;
}
