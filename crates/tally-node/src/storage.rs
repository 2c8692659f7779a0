//! RocksDB-backed [`LedgerStore`].
//!
//! User records live in the `users` column family, keyed by the big-endian
//! user id and encoded with bincode. Every write is synced to the WAL before
//! returning, so a record acknowledged to the user survives a crash.

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteOptions, DB};

use tally_core::error::StoreError;
use tally_core::traits::LedgerStore;
use tally_core::types::{StoredUser, UserId};

const CF_USERS: &str = "users";

/// All column family names.
const ALL_CFS: &[&str] = &[CF_USERS];

pub struct RocksLedger {
    db: DB,
}

impl RocksLedger {
    /// Open or create a ledger database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { db })
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("missing column family: {name}")))
    }

    fn user_key(id: UserId) -> [u8; 8] {
        id.0.to_be_bytes()
    }

    fn synced() -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        opts
    }
}

impl LedgerStore for RocksLedger {
    fn upsert(&self, user: &StoredUser) -> Result<(), StoreError> {
        let cf = self.cf_handle(CF_USERS)?;
        let value = bincode::encode_to_vec(user, bincode::config::standard())
            .map_err(|e| StoreError::Encoding(e.to_string()))?;
        self.db
            .put_cf_opt(cf, Self::user_key(user.id), value, &Self::synced())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn delete(&self, id: UserId) -> Result<(), StoreError> {
        let cf = self.cf_handle(CF_USERS)?;
        self.db
            .delete_cf_opt(cf, Self::user_key(id), &Self::synced())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn load_all(&self) -> Result<Vec<StoredUser>, StoreError> {
        let cf = self.cf_handle(CF_USERS)?;
        let mut users = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            let (user, _): (StoredUser, usize) =
                bincode::decode_from_slice(&value, bincode::config::standard()).map_err(|e| {
                    StoreError::Decoding {
                        key: hex_key(&key),
                        reason: e.to_string(),
                    }
                })?;
            users.push(user);
        }
        Ok(users)
    }
}

fn hex_key(key: &[u8]) -> String {
    key.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::types::{BalanceEntry, BalanceKind};

    fn temp_store() -> (RocksLedger, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksLedger::open(dir.path().join("ledger")).unwrap();
        (store, dir)
    }

    fn user(id: i64, balance: u64) -> StoredUser {
        StoredUser {
            id: UserId(id),
            name: format!("user-{id}"),
            balance,
            invites: vec![UserId(id + 100), UserId(id + 101)],
            history: vec![BalanceEntry {
                kind: BalanceKind::ReferralInviter,
                delta: balance as i64,
                balance_after: balance,
                at: 1_700_000_000,
            }],
        }
    }

    #[test]
    fn empty_store_loads_nothing() {
        let (store, _dir) = temp_store();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn upsert_then_load() {
        let (store, _dir) = temp_store();
        store.upsert(&user(1, 300)).unwrap();
        store.upsert(&user(2, 0)).unwrap();
        let mut all = store.load_all().unwrap();
        all.sort_by_key(|u| u.id);
        assert_eq!(all, vec![user(1, 300), user(2, 0)]);
    }

    #[test]
    fn upsert_replaces_existing() {
        let (store, _dir) = temp_store();
        store.upsert(&user(1, 300)).unwrap();
        store.upsert(&user(1, 450)).unwrap();
        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].balance, 450);
    }

    #[test]
    fn delete_removes_and_tolerates_missing() {
        let (store, _dir) = temp_store();
        store.upsert(&user(1, 10)).unwrap();
        store.delete(UserId(1)).unwrap();
        store.delete(UserId(1)).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger");
        {
            let store = RocksLedger::open(&path).unwrap();
            store.upsert(&user(7, 1_234)).unwrap();
            store.flush().unwrap();
        }
        let store = RocksLedger::open(&path).unwrap();
        assert_eq!(store.load_all().unwrap(), vec![user(7, 1_234)]);
    }
}
