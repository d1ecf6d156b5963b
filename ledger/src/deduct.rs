//! The deductor: atomically removes stars from a user's balance.

use star_ledger_core::{CreditBalance, CreditTransaction, DeductReceipt, UserId};
use star_ledger_store::LedgerStore;

use crate::error::{LedgerError, Result};
use crate::CreditLedger;

impl<S: LedgerStore> CreditLedger<S> {
    /// Deduct `amount` stars from a user's balance.
    ///
    /// The subscription pool is always spent before the package pool, since
    /// subscription stars expire at period end and package stars do not.
    ///
    /// Runs an optimistic retry loop: read the row, compute the pool split,
    /// then commit through a conditional update guarded on the counter values
    /// just read. A lost race re-reads and retries, up to the configured
    /// attempt budget. Exactly one write commits on success; no failure path
    /// writes anything.
    ///
    /// A zero `amount` returns the current balance without touching the
    /// store.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientCredits`] if the total balance is below
    ///   `amount` (checked fresh on every attempt, never retried).
    /// - [`LedgerError::ContentionExhausted`] if every attempt lost its race.
    /// - [`LedgerError::InvalidAmount`] if `amount` is negative.
    /// - [`LedgerError::InvariantViolation`] if a computed pool value would
    ///   go negative; the stored row was already corrupt.
    /// - [`LedgerError::Store`] if the store is unavailable.
    pub fn deduct(&self, user_id: &UserId, amount: i64) -> Result<DeductReceipt> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }

        if amount == 0 {
            return Ok(DeductReceipt {
                balance: self.balance(user_id)?,
                from_subscription: 0,
                from_package: 0,
            });
        }

        let mut last_observed = 0;
        for attempt in 1..=self.config.max_update_attempts {
            let row = self.store.get_row(user_id)?;
            let balance = row
                .as_ref()
                .map_or_else(CreditBalance::default, CreditBalance::from_row);
            last_observed = balance.total();

            if balance.total() < amount {
                return Err(LedgerError::InsufficientCredits {
                    balance: balance.total(),
                    required: amount,
                });
            }

            // A positive total implies the row exists.
            let Some(row) = row else { continue };

            let from_subscription = balance.subscription_stars.min(amount);
            let from_package = amount - from_subscription;
            let new_subscription = balance.subscription_stars - from_subscription;
            let new_package = balance.package_stars - from_package;

            if new_subscription < 0 || new_package < 0 {
                tracing::error!(
                    user_id = %user_id,
                    amount,
                    new_subscription,
                    new_package,
                    "computed pool went negative despite balance check; refusing write"
                );
                return Err(LedgerError::InvariantViolation {
                    user_id: user_id.to_string(),
                    subscription_stars: new_subscription,
                    package_stars: new_package,
                });
            }

            match self.store.compare_and_update(
                user_id,
                &row.snapshot(),
                new_subscription,
                new_package,
            )? {
                Some(updated) => {
                    let balance = CreditBalance::from_row(&updated);
                    self.record(&CreditTransaction::usage(
                        *user_id,
                        amount,
                        balance.total(),
                        serde_json::Value::Null,
                    ));
                    tracing::debug!(
                        user_id = %user_id,
                        amount,
                        from_subscription,
                        from_package,
                        attempt,
                        "stars deducted"
                    );
                    return Ok(DeductReceipt {
                        balance,
                        from_subscription,
                        from_package,
                    });
                }
                None => {
                    tracing::debug!(
                        user_id = %user_id,
                        attempt,
                        "deduction lost a concurrent update race"
                    );
                }
            }
        }

        tracing::error!(
            user_id = %user_id,
            amount,
            attempts = self.config.max_update_attempts,
            "deduction retry budget exhausted"
        );
        Err(LedgerError::ContentionExhausted {
            attempts: self.config.max_update_attempts,
            balance: last_observed,
        })
    }
}
