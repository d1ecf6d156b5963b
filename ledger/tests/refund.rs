//! Refunder integration tests.

mod common;

use common::{ledger, seed_legacy, seed_pools};
use star_ledger::{LedgerError, LedgerStore, TransactionKind, UserId};

#[test]
fn refund_lands_in_the_package_pool() {
    let (ledger, store) = ledger();
    let user = UserId::generate();
    seed_pools(&store, user, 5, 10);

    let balance = ledger.refund(&user, 3, "generation_failed").unwrap();

    assert_eq!(balance.subscription_stars, 5);
    assert_eq!(balance.package_stars, 13);

    let row = store.get_row(&user).unwrap().unwrap();
    assert_eq!(row.legacy_amount, 18);
}

#[test]
fn refund_creates_the_row_for_an_unknown_user() {
    let (ledger, _store) = ledger();
    let user = UserId::generate();

    let balance = ledger.refund(&user, 25, "generation_failed").unwrap();

    assert_eq!(balance.subscription_stars, 0);
    assert_eq!(balance.package_stars, 25);
}

#[test]
fn refund_normalizes_a_legacy_row() {
    let (ledger, store) = ledger();
    let user = UserId::generate();
    seed_legacy(&store, user, 75);

    let balance = ledger.refund(&user, 10, "generation_failed").unwrap();

    assert_eq!(balance.package_stars, 85);

    let row = store.get_row(&user).unwrap().unwrap();
    assert_eq!(row.subscription_stars, 0);
    assert_eq!(row.package_stars, 85);
    assert_eq!(row.legacy_amount, 85);
}

#[test]
fn refund_requires_a_positive_amount() {
    let (ledger, _store) = ledger();
    let user = UserId::generate();

    for amount in [0, -5] {
        let err = ledger.refund(&user, amount, "whatever").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
    }
}

#[test]
fn refund_records_the_reason() {
    let (ledger, store) = ledger();
    let user = UserId::generate();
    seed_pools(&store, user, 0, 50);

    ledger.refund(&user, 20, "provider_timeout").unwrap();

    let history = ledger.history(&user, 1, 0).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionKind::Refund);
    assert_eq!(history[0].amount, 20);
    assert_eq!(history[0].balance_after, 70);
    assert_eq!(history[0].metadata["reason"], "provider_timeout");
}
