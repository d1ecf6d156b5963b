//! `RocksDB` storage implementation.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use star_ledger_core::{CreditTransaction, LedgerRow, PoolSnapshot, TransactionId, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::LedgerStore;

/// RocksDB-backed storage implementation.
///
/// `RocksDB` has no native conditional put, so all writes to the ledger
/// column family are serialized through an internal mutex; the compare and
/// the write of `compare_and_update` happen under the same guard. Readers
/// never take the lock.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    row_write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            row_write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn read_row(&self, user_id: &UserId) -> Result<Option<LedgerRow>> {
        let cf = self.cf(cf::LEDGER)?;
        let key = keys::row_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn write_row(&self, row: &LedgerRow) -> Result<()> {
        let cf = self.cf(cf::LEDGER)?;
        let key = keys::row_key(&row.user_id);
        let value = Self::serialize(row)?;

        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>> {
        let cf = self.cf(cf::TRANSACTIONS)?;
        let key = keys::transaction_key(transaction_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}

impl LedgerStore for RocksStore {
    fn get_row(&self, user_id: &UserId) -> Result<Option<LedgerRow>> {
        self.read_row(user_id)
    }

    fn insert_row_if_absent(&self, row: &LedgerRow) -> Result<LedgerRow> {
        let _guard = self
            .row_write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = self.read_row(&row.user_id)? {
            return Ok(existing);
        }

        self.write_row(row)?;
        Ok(row.clone())
    }

    fn put_row(&self, row: &LedgerRow) -> Result<()> {
        let _guard = self
            .row_write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.write_row(row)
    }

    fn compare_and_update(
        &self,
        user_id: &UserId,
        expected: &PoolSnapshot,
        subscription_stars: i64,
        package_stars: i64,
    ) -> Result<Option<LedgerRow>> {
        let _guard = self
            .row_write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(row) = self.read_row(user_id)? else {
            return Ok(None);
        };

        if row.snapshot() != *expected {
            tracing::trace!(user_id = %user_id, "conditional update missed");
            return Ok(None);
        }

        let updated = row.with_pools(subscription_stars, package_stars);
        self.write_row(&updated)?;

        Ok(Some(updated))
    }

    fn put_transaction(&self, transaction: &CreditTransaction) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;

        let tx_key = keys::transaction_key(&transaction.id);
        let user_tx_key = keys::user_transaction_key(&transaction.user_id, &transaction.id);
        let value = Self::serialize(transaction)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_tx, &tx_key, &value);
        batch.put_cf(&cf_by_user, &user_tx_key, []); // Index entry (empty value)

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        let cf_by_user = self.cf(cf::TRANSACTIONS_BY_USER)?;
        let prefix = keys::user_transactions_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, rocksdb::Direction::Forward),
        );

        // Collect matching keys, then reverse: ULIDs sort oldest-first within
        // the prefix and the history view wants newest first.
        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            all_keys.push(key.to_vec());
        }
        all_keys.reverse();

        let mut transactions = Vec::new();
        for key in all_keys.into_iter().skip(offset) {
            if transactions.len() >= limit {
                break;
            }

            let tx_id = keys::extract_transaction_id_from_user_key(&key);
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn row_roundtrip() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        assert!(store.get_row(&user_id).unwrap().is_none());

        let row = LedgerRow::new(user_id).with_pools(5, 10);
        store.put_row(&row).unwrap();

        let retrieved = store.get_row(&user_id).unwrap().unwrap();
        assert_eq!(retrieved.subscription_stars, 5);
        assert_eq!(retrieved.package_stars, 10);
        assert_eq!(retrieved.legacy_amount, 15);
    }

    #[test]
    fn insert_if_absent_never_overwrites() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let row = LedgerRow::new(user_id).with_pools(0, 100);
        store.put_row(&row).unwrap();

        let existing = store.insert_row_if_absent(&LedgerRow::new(user_id)).unwrap();
        assert_eq!(existing.package_stars, 100);

        let reread = store.get_row(&user_id).unwrap().unwrap();
        assert_eq!(reread.package_stars, 100);
    }

    #[test]
    fn compare_and_update_commits_on_match() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let row = store
            .insert_row_if_absent(&LedgerRow::new(user_id).with_pools(5, 10))
            .unwrap();

        let updated = store
            .compare_and_update(&user_id, &row.snapshot(), 0, 8)
            .unwrap()
            .unwrap();
        assert_eq!(updated.subscription_stars, 0);
        assert_eq!(updated.package_stars, 8);
        assert_eq!(updated.legacy_amount, 8);
    }

    #[test]
    fn compare_and_update_refuses_stale_snapshot() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let row = store
            .insert_row_if_absent(&LedgerRow::new(user_id).with_pools(5, 10))
            .unwrap();
        let stale = row.snapshot();

        // Another writer lands first.
        store
            .compare_and_update(&user_id, &stale, 5, 7)
            .unwrap()
            .unwrap();

        assert!(store
            .compare_and_update(&user_id, &stale, 0, 8)
            .unwrap()
            .is_none());

        let reread = store.get_row(&user_id).unwrap().unwrap();
        assert_eq!(reread.package_stars, 7);
    }

    #[test]
    fn compare_and_update_misses_absent_row() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        let phantom = LedgerRow::new(user_id);
        assert!(store
            .compare_and_update(&user_id, &phantom.snapshot(), 0, 5)
            .unwrap()
            .is_none());
        assert!(store.get_row(&user_id).unwrap().is_none());
    }

    #[test]
    fn legacy_counter_participates_in_guard() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        // Pre-migration row: pools empty, balance lives in the mirror.
        let mut legacy = LedgerRow::new(user_id);
        legacy.legacy_amount = 75;
        store.put_row(&legacy).unwrap();

        // A guard that assumes the mirror is zero must not match.
        let mut wrong = legacy.snapshot();
        wrong.legacy_amount = 0;
        assert!(store
            .compare_and_update(&user_id, &wrong, 0, 65)
            .unwrap()
            .is_none());

        // The true snapshot commits and normalizes the row.
        let updated = store
            .compare_and_update(&user_id, &legacy.snapshot(), 0, 65)
            .unwrap()
            .unwrap();
        assert_eq!(updated.package_stars, 65);
        assert_eq!(updated.legacy_amount, 65);
    }

    #[test]
    fn transactions_list_newest_first() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();

        for amount in [10, 20, 30] {
            let tx = CreditTransaction::package_purchase(user_id, amount, amount);
            store.put_transaction(&tx).unwrap();
            // ULIDs within the same millisecond are not ordered.
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let listed = store.list_transactions_by_user(&user_id, 10, 0).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].amount, 30);
        assert_eq!(listed[2].amount, 10);

        let page = store.list_transactions_by_user(&user_id, 1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].amount, 20);
    }

    #[test]
    fn transactions_scoped_to_user() {
        let (store, _dir) = create_test_store();
        let alice = UserId::generate();
        let bob = UserId::generate();

        store
            .put_transaction(&CreditTransaction::package_purchase(alice, 10, 10))
            .unwrap();
        store
            .put_transaction(&CreditTransaction::package_purchase(bob, 99, 99))
            .unwrap();

        let listed = store.list_transactions_by_user(&alice, 10, 0).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].amount, 10);
    }
}
