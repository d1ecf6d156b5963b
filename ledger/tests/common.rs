//! Common test utilities for star-ledger integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use star_ledger::{CreditLedger, LedgerRow, LedgerStore, MemoryStore, UserId};

/// Build a ledger over a fresh in-memory store, returning both.
pub fn ledger() -> (CreditLedger<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (CreditLedger::new(Arc::clone(&store)), store)
}

/// Seed a row with explicit pool values (mirror kept in sync).
pub fn seed_pools(store: &MemoryStore, user_id: UserId, subscription: i64, package: i64) {
    store
        .put_row(&LedgerRow::new(user_id).with_pools(subscription, package))
        .unwrap();
}

/// Seed a pre-migration row: both pools zero, balance in the legacy column.
pub fn seed_legacy(store: &MemoryStore, user_id: UserId, amount: i64) {
    let mut row = LedgerRow::new(user_id);
    row.legacy_amount = amount;
    store.put_row(&row).unwrap();
}
