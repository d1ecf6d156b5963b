//! Credit transaction types for the star ledger.
//!
//! Every successful balance mutation produces a transaction record for audit
//! and history views. Transactions use ULIDs for time-ordered IDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// A credit transaction representing a balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Amount in stars. Positive = credit, negative = debit.
    pub amount: i64,

    /// What kind of change this was.
    pub kind: TransactionKind,

    /// Total balance after this transaction.
    pub balance_after: i64,

    /// Human-readable description.
    pub description: String,

    /// Additional metadata (generation id, model, expired stars, etc.).
    pub metadata: serde_json::Value,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// Create a usage transaction (deduction for paid work).
    #[must_use]
    pub fn usage(
        user_id: UserId,
        amount: i64,
        balance_after: i64,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount: -amount.abs(), // Always negative for usage
            kind: TransactionKind::Usage,
            balance_after,
            description: format!("Used {} stars", amount.abs()),
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Create a package purchase transaction.
    #[must_use]
    pub fn package_purchase(user_id: UserId, amount: i64, balance_after: i64) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount,
            kind: TransactionKind::PackagePurchase,
            balance_after,
            description: format!("Purchased {amount} package stars"),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Create a subscription grant transaction.
    #[must_use]
    pub fn subscription_grant(user_id: UserId, amount: i64, balance_after: i64) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount,
            kind: TransactionKind::SubscriptionGrant,
            balance_after,
            description: format!("Monthly grant of {amount} subscription stars"),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Create a renewal transaction.
    ///
    /// Recorded as a grant; the stars discarded from the previous period are
    /// carried in the metadata rather than as a separate debit.
    #[must_use]
    pub fn renewal(user_id: UserId, amount: i64, balance_after: i64, expired: i64) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount,
            kind: TransactionKind::SubscriptionGrant,
            balance_after,
            description: format!("Subscription renewed: {amount} stars"),
            metadata: serde_json::json!({ "expired": expired }),
            created_at: Utc::now(),
        }
    }

    /// Create an expiry transaction for a lapsed subscription.
    #[must_use]
    pub fn expiry(user_id: UserId, expired: i64, balance_after: i64) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount: -expired.abs(),
            kind: TransactionKind::SubscriptionExpiry,
            balance_after,
            description: format!("{} subscription stars expired", expired.abs()),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    /// Create a refund transaction.
    #[must_use]
    pub fn refund(user_id: UserId, amount: i64, balance_after: i64, reason: &str) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount,
            kind: TransactionKind::Refund,
            balance_after,
            description: format!("Refund: {reason}"),
            metadata: serde_json::json!({ "reason": reason }),
            created_at: Utc::now(),
        }
    }
}

/// Type of credit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Stars deducted for a generation.
    Usage,

    /// User purchased a one-time star package.
    PackagePurchase,

    /// Monthly subscription star grant (initial or renewal).
    SubscriptionGrant,

    /// Unused subscription stars expired at period end.
    SubscriptionExpiry,

    /// Stars returned for a failed generation.
    Refund,
}

impl TransactionKind {
    /// Check if this transaction kind adds stars.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(
            self,
            Self::PackagePurchase | Self::SubscriptionGrant | Self::Refund
        )
    }

    /// Check if this transaction kind removes stars.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Usage | Self::SubscriptionExpiry)
    }
}
