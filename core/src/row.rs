//! The persisted ledger row.
//!
//! One row exists per user, created lazily on the first balance mutation and
//! never deleted by the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// The persisted credit record for a single user.
///
/// The two pool counters are the source of truth. `legacy_amount` mirrors
/// their sum for components that still read the pre-split column; every write
/// performed by the ledger keeps the mirror in sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRow {
    /// The user this row belongs to (primary key).
    pub user_id: UserId,

    /// Stars granted by the active subscription; expire at period end.
    pub subscription_stars: i64,

    /// Stars bought outright; never expire.
    pub package_stars: i64,

    /// Pre-split combined balance, kept equal to the pool sum on every write.
    ///
    /// Rows written before the split migration may carry a positive value
    /// here while both pools read zero; see [`crate::CreditBalance::from_row`]
    /// for how such rows are interpreted.
    pub legacy_amount: i64,

    /// When the row was first created.
    pub created_at: DateTime<Utc>,

    /// When the row was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl LedgerRow {
    /// Create an empty row for a user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            subscription_stars: 0,
            package_stars: 0,
            legacy_amount: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Return a copy of this row with both pools replaced.
    ///
    /// The legacy mirror is set to the new pool sum and `updated_at` is
    /// refreshed; `created_at` is preserved.
    #[must_use]
    pub fn with_pools(mut self, subscription_stars: i64, package_stars: i64) -> Self {
        self.subscription_stars = subscription_stars;
        self.package_stars = package_stars;
        self.legacy_amount = subscription_stars + package_stars;
        self.updated_at = Utc::now();
        self
    }

    /// Snapshot of the counters used to guard conditional updates.
    #[must_use]
    pub const fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            subscription_stars: self.subscription_stars,
            package_stars: self.package_stars,
            legacy_amount: self.legacy_amount,
        }
    }
}

/// The counter values a conditional update compares against.
///
/// All three persisted counters participate in the comparison. Comparing only
/// the split pair would let two concurrent writers both match a pre-migration
/// row (both pools zero, positive legacy amount) and lose an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Observed subscription pool.
    pub subscription_stars: i64,

    /// Observed package pool.
    pub package_stars: i64,

    /// Observed legacy mirror.
    pub legacy_amount: i64,
}
