//! Read-side operations: balance, admission query, history.

use star_ledger_core::{CreditBalance, CreditTransaction, UserId};
use star_ledger_store::LedgerStore;

use crate::error::Result;
use crate::CreditLedger;

impl<S: LedgerStore> CreditLedger<S> {
    /// Get a user's normalized balance.
    ///
    /// An absent row reads as a zero balance; reading never creates a row.
    /// Pre-migration rows have their legacy amount folded into the package
    /// pool (see [`CreditBalance::from_row`]).
    ///
    /// # Errors
    ///
    /// Returns [`crate::LedgerError::Store`] if the store is unavailable.
    pub fn balance(&self, user_id: &UserId) -> Result<CreditBalance> {
        let row = self.store.get_row(user_id)?;
        Ok(row
            .as_ref()
            .map_or_else(CreditBalance::default, CreditBalance::from_row))
    }

    /// Check whether a user can afford `amount` stars.
    ///
    /// Advisory only: nothing is reserved or locked, so a subsequent
    /// [`deduct`](Self::deduct) may still fail if concurrent requests drain
    /// the balance in between. The real authorization happens at deduct time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LedgerError::Store`] if the store is unavailable.
    pub fn has_enough_credits(&self, user_id: &UserId, amount: i64) -> Result<bool> {
        Ok(self.balance(user_id)?.total() >= amount)
    }

    /// List a user's credit transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LedgerError::Store`] if the store is unavailable.
    pub fn history(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        Ok(self.store.list_transactions_by_user(user_id, limit, offset)?)
    }
}
