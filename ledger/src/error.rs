//! Error types for ledger operations.

use star_ledger_store::StoreError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Balance genuinely too low for the requested deduction.
    ///
    /// Never retried by the ledger; callers reject the paid action and route
    /// the user towards a purchase flow.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Total balance observed when the operation was refused.
        balance: i64,
        /// Stars the operation needed.
        required: i64,
    },

    /// The conditional-update retry budget ran out under concurrent writers.
    ///
    /// Transient: the whole operation may be retried by the caller.
    #[error("contention exhausted after {attempts} attempts; last observed balance {balance}")]
    ContentionExhausted {
        /// How many conditional updates were attempted.
        attempts: u32,
        /// Total balance seen on the final attempt.
        balance: i64,
    },

    /// The caller passed a negative (or, where additions are concerned,
    /// non-positive) amount. Amounts are validated upstream; this is a
    /// defensive guard.
    #[error("invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
    },

    /// A computed pool value would go negative despite the balance check
    /// passing. Indicates pre-existing data corruption; the write is refused
    /// and never retried.
    #[error(
        "pool would go negative for user {user_id}: subscription={subscription_stars}, package={package_stars}"
    )]
    InvariantViolation {
        /// The affected user.
        user_id: String,
        /// Computed subscription pool value.
        subscription_stars: i64,
        /// Computed package pool value.
        package_stars: i64,
    },

    /// Underlying storage call failed; the balance may or may not have
    /// changed. Propagated as-is, never treated as success.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Check whether retrying the whole operation can help.
    ///
    /// Domain errors (`InsufficientCredits`, `InvalidAmount`) and corruption
    /// reports are final; contention and store failures are transient.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ContentionExhausted { .. } | Self::Store(_))
    }
}
