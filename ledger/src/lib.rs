//! Split-pool credit ledger for generation billing.
//!
//! Each user's spendable balance is split into two pools: **subscription
//! stars** granted by a recurring plan (they expire at the end of the billing
//! period) and **package stars** bought outright (they never expire). The
//! ledger debits and credits this balance correctly under concurrent access
//! from generation requests, payment webhooks, and renewal jobs.
//!
//! All state lives in a [`LedgerStore`]; the ledger itself is stateless
//! between calls and holds no in-process cache or lock. Deductions run an
//! optimistic retry loop over the store's conditional update, so they are
//! safe across processes and replicas, not just within one.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use star_ledger::{CreditLedger, MemoryStore, UserId};
//!
//! let ledger = CreditLedger::new(Arc::new(MemoryStore::new()));
//! let user = UserId::generate();
//!
//! ledger.add_package_stars(&user, 100)?;
//! let receipt = ledger.deduct(&user, 30)?;
//! assert_eq!(receipt.balance.total(), 70);
//! # Ok::<(), star_ledger::LedgerError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;

mod allocate;
mod balance;
mod deduct;
mod refund;

use std::sync::Arc;

pub use error::{LedgerError, Result};

pub use star_ledger_core::{
    CreditBalance, CreditTransaction, DeductReceipt, ExpiredStars, LedgerRow, PoolSnapshot,
    TransactionId, TransactionKind, UserId,
};
pub use star_ledger_store::{LedgerStore, MemoryStore, RocksStore, StoreError};

/// Default retry budget for conditional updates.
pub const DEFAULT_MAX_UPDATE_ATTEMPTS: u32 = 10;

/// Tunable knobs for the ledger.
#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    /// How many times a lost conditional update is retried before the
    /// operation fails with [`LedgerError::ContentionExhausted`].
    pub max_update_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_update_attempts: DEFAULT_MAX_UPDATE_ATTEMPTS,
        }
    }
}

/// The credit ledger.
///
/// Cheap to clone; clones share the same store handle. Every operation maps
/// to one or more store round-trips and nothing is cached in between, so a
/// single instance may be shared freely across request handlers.
pub struct CreditLedger<S> {
    store: Arc<S>,
    config: LedgerConfig,
}

impl<S> Clone for CreditLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config,
        }
    }
}

impl<S: LedgerStore> CreditLedger<S> {
    /// Create a ledger with the default configuration.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    /// Create a ledger with an explicit configuration.
    #[must_use]
    pub const fn with_config(store: Arc<S>, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    /// Append an audit transaction, best-effort.
    ///
    /// The balance write has already committed when this runs; a failure here
    /// loses a history entry, not money. It is logged at `warn` and not
    /// propagated.
    fn record(&self, transaction: &CreditTransaction) {
        if let Err(error) = self.store.put_transaction(transaction) {
            tracing::warn!(
                user_id = %transaction.user_id,
                %error,
                "failed to record credit transaction"
            );
        }
    }
}
