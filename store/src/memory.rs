//! In-memory storage implementation for tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use star_ledger_core::{CreditTransaction, LedgerRow, PoolSnapshot, UserId};

use crate::error::Result;
use crate::LedgerStore;

/// A `HashMap`-backed [`LedgerStore`] with the same conditional-update
/// semantics as the `RocksDB` implementation.
///
/// Intended for unit and integration tests; nothing is persisted.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    rows: HashMap<UserId, LedgerRow>,
    transactions: HashMap<UserId, Vec<CreditTransaction>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LedgerStore for MemoryStore {
    fn get_row(&self, user_id: &UserId) -> Result<Option<LedgerRow>> {
        Ok(self.lock().rows.get(user_id).cloned())
    }

    fn insert_row_if_absent(&self, row: &LedgerRow) -> Result<LedgerRow> {
        let mut inner = self.lock();
        let entry = inner
            .rows
            .entry(row.user_id)
            .or_insert_with(|| row.clone());
        Ok(entry.clone())
    }

    fn put_row(&self, row: &LedgerRow) -> Result<()> {
        self.lock().rows.insert(row.user_id, row.clone());
        Ok(())
    }

    fn compare_and_update(
        &self,
        user_id: &UserId,
        expected: &PoolSnapshot,
        subscription_stars: i64,
        package_stars: i64,
    ) -> Result<Option<LedgerRow>> {
        let mut inner = self.lock();

        let Some(row) = inner.rows.get(user_id) else {
            return Ok(None);
        };

        if row.snapshot() != *expected {
            return Ok(None);
        }

        let updated = row.clone().with_pools(subscription_stars, package_stars);
        inner.rows.insert(*user_id, updated.clone());

        Ok(Some(updated))
    }

    fn put_transaction(&self, transaction: &CreditTransaction) -> Result<()> {
        self.lock()
            .transactions
            .entry(transaction.user_id)
            .or_default()
            .push(transaction.clone());
        Ok(())
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        let inner = self.lock();
        let transactions = inner
            .transactions
            .get(user_id)
            .map(|txs| txs.iter().rev().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default();
        Ok(transactions)
    }
}
