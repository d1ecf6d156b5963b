//! The refunder: returns stars for failed generations.

use star_ledger_core::{CreditBalance, CreditTransaction, LedgerRow, UserId};
use star_ledger_store::LedgerStore;

use crate::error::{LedgerError, Result};
use crate::CreditLedger;

impl<S: LedgerStore> CreditLedger<S> {
    /// Return `amount` stars to a user after a failed generation.
    ///
    /// Refunds always land in the package pool, regardless of which pool
    /// originally paid for the work. The row is created first if absent, then
    /// the credit is applied through the same conditional-update loop as the
    /// deductor, so refunds racing against deductions cannot lose updates.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InvalidAmount`] if `amount` is not positive.
    /// - [`LedgerError::ContentionExhausted`] if every attempt lost its race.
    /// - [`LedgerError::Store`] if the store is unavailable.
    pub fn refund(&self, user_id: &UserId, amount: i64, reason: &str) -> Result<CreditBalance> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }

        self.store.insert_row_if_absent(&LedgerRow::new(*user_id))?;

        let mut last_observed = 0;
        for attempt in 1..=self.config.max_update_attempts {
            // The row was just ensured; a miss here means the store lost it.
            let Some(row) = self.store.get_row(user_id)? else {
                continue;
            };
            let current = CreditBalance::from_row(&row);
            last_observed = current.total();

            match self.store.compare_and_update(
                user_id,
                &row.snapshot(),
                current.subscription_stars,
                current.package_stars + amount,
            )? {
                Some(updated) => {
                    let balance = CreditBalance::from_row(&updated);
                    self.record(&CreditTransaction::refund(
                        *user_id,
                        amount,
                        balance.total(),
                        reason,
                    ));
                    tracing::info!(
                        user_id = %user_id,
                        amount,
                        reason,
                        total = balance.total(),
                        "stars refunded"
                    );
                    return Ok(balance);
                }
                None => {
                    tracing::debug!(
                        user_id = %user_id,
                        attempt,
                        "refund lost a concurrent update race"
                    );
                }
            }
        }

        tracing::error!(
            user_id = %user_id,
            amount,
            attempts = self.config.max_update_attempts,
            "refund retry budget exhausted"
        );
        Err(LedgerError::ContentionExhausted {
            attempts: self.config.max_update_attempts,
            balance: last_observed,
        })
    }
}
