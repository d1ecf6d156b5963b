//! Normalized balance views and operation receipts.

use serde::{Deserialize, Serialize};

use crate::LedgerRow;

/// A user's spendable balance, split by pool.
///
/// This is a derived view: the total is always computed from the two pools
/// and is never stored independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    /// Stars granted by the active subscription; expire at period end.
    pub subscription_stars: i64,

    /// Stars bought outright; never expire.
    pub package_stars: i64,
}

impl CreditBalance {
    /// Normalize a stored row into a balance.
    ///
    /// Rows written before the split migration carry their whole balance in
    /// `legacy_amount` while both pools read zero. Such a balance is treated
    /// as package stars: historical grants were bought outright and inventing
    /// an expiry date for them would be wrong.
    #[must_use]
    pub const fn from_row(row: &LedgerRow) -> Self {
        if row.subscription_stars == 0 && row.package_stars == 0 && row.legacy_amount > 0 {
            Self {
                subscription_stars: 0,
                package_stars: row.legacy_amount,
            }
        } else {
            Self {
                subscription_stars: row.subscription_stars,
                package_stars: row.package_stars,
            }
        }
    }

    /// Total spendable stars across both pools.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.subscription_stars + self.package_stars
    }
}

/// The outcome of a successful deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductReceipt {
    /// Balance after the deduction committed.
    pub balance: CreditBalance,

    /// Stars taken from the subscription pool.
    pub from_subscription: i64,

    /// Stars taken from the package pool.
    pub from_package: i64,
}

/// The outcome of expiring a user's subscription pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredStars {
    /// Subscription stars that were discarded.
    pub expired: i64,

    /// Package stars left untouched.
    pub remaining_package: i64,
}
