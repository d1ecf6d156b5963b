//! The allocator: grants, purchases, expiry, and renewal.
//!
//! These operations are invoked from single-writer contexts (one webhook per
//! payment event, one renewal job per billing cycle), so they write
//! last-writer-wins instead of running the deductor's conditional-update
//! loop.

use star_ledger_core::{CreditBalance, CreditTransaction, ExpiredStars, LedgerRow, UserId};
use star_ledger_store::LedgerStore;

use crate::error::{LedgerError, Result};
use crate::CreditLedger;

impl<S: LedgerStore> CreditLedger<S> {
    /// Add stars to the subscription pool.
    ///
    /// Used when a subscription payment is confirmed. Creates the row if the
    /// user has never held credits before.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] for a negative amount, or
    /// [`LedgerError::Store`] if the store is unavailable.
    pub fn add_subscription_stars(&self, user_id: &UserId, amount: i64) -> Result<CreditBalance> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let row = self.store.get_row(user_id)?;
        let current = row
            .as_ref()
            .map_or_else(CreditBalance::default, CreditBalance::from_row);

        let updated = row
            .unwrap_or_else(|| LedgerRow::new(*user_id))
            .with_pools(current.subscription_stars + amount, current.package_stars);
        self.store.put_row(&updated)?;

        let balance = CreditBalance::from_row(&updated);
        self.record(&CreditTransaction::subscription_grant(
            *user_id,
            amount,
            balance.total(),
        ));
        tracing::info!(
            user_id = %user_id,
            amount,
            total = balance.total(),
            "subscription stars granted"
        );
        Ok(balance)
    }

    /// Add stars to the package pool.
    ///
    /// Used when a one-time purchase is confirmed. Creates the row if the
    /// user has never held credits before.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] for a negative amount, or
    /// [`LedgerError::Store`] if the store is unavailable.
    pub fn add_package_stars(&self, user_id: &UserId, amount: i64) -> Result<CreditBalance> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }

        let row = self.store.get_row(user_id)?;
        let current = row
            .as_ref()
            .map_or_else(CreditBalance::default, CreditBalance::from_row);

        let updated = row
            .unwrap_or_else(|| LedgerRow::new(*user_id))
            .with_pools(current.subscription_stars, current.package_stars + amount);
        self.store.put_row(&updated)?;

        let balance = CreditBalance::from_row(&updated);
        self.record(&CreditTransaction::package_purchase(
            *user_id,
            amount,
            balance.total(),
        ));
        tracing::info!(
            user_id = %user_id,
            amount,
            total = balance.total(),
            "package stars purchased"
        );
        Ok(balance)
    }

    /// Zero the subscription pool at the end of a billing period.
    ///
    /// The prior pool value is returned as the expired amount for audit and
    /// telemetry; the package pool is untouched. A user with no row has
    /// nothing to expire, and none is created.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Store`] if the store is unavailable.
    pub fn reset_subscription_stars(&self, user_id: &UserId) -> Result<ExpiredStars> {
        let Some(row) = self.store.get_row(user_id)? else {
            return Ok(ExpiredStars {
                expired: 0,
                remaining_package: 0,
            });
        };

        let current = CreditBalance::from_row(&row);
        let expired = current.subscription_stars;

        let updated = row.with_pools(0, current.package_stars);
        self.store.put_row(&updated)?;

        if expired > 0 {
            self.record(&CreditTransaction::expiry(
                *user_id,
                expired,
                current.package_stars,
            ));
        }
        tracing::info!(
            user_id = %user_id,
            expired,
            remaining_package = current.package_stars,
            "subscription stars expired"
        );
        Ok(ExpiredStars {
            expired,
            remaining_package: current.package_stars,
        })
    }

    /// Replace the subscription pool with a fresh monthly allowance.
    ///
    /// The prior subscription stars expire; they do not roll over. The
    /// package pool is preserved. Creates the row if absent.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] for a negative amount, or
    /// [`LedgerError::Store`] if the store is unavailable.
    pub fn renew_subscription(
        &self,
        user_id: &UserId,
        new_monthly_stars: i64,
    ) -> Result<CreditBalance> {
        if new_monthly_stars < 0 {
            return Err(LedgerError::InvalidAmount {
                amount: new_monthly_stars,
            });
        }

        let row = self.store.get_row(user_id)?;
        let current = row
            .as_ref()
            .map_or_else(CreditBalance::default, CreditBalance::from_row);
        let expired = current.subscription_stars;

        let updated = row
            .unwrap_or_else(|| LedgerRow::new(*user_id))
            .with_pools(new_monthly_stars, current.package_stars);
        self.store.put_row(&updated)?;

        let balance = CreditBalance::from_row(&updated);
        self.record(&CreditTransaction::renewal(
            *user_id,
            new_monthly_stars,
            balance.total(),
            expired,
        ));
        tracing::info!(
            user_id = %user_id,
            granted = new_monthly_stars,
            expired,
            package_kept = current.package_stars,
            "subscription renewed"
        );
        Ok(balance)
    }
}
