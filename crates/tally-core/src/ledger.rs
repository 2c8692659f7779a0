//! In-memory [`LedgerStore`] for tests and dry runs.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::traits::LedgerStore;
use crate::types::{StoredUser, UserId};

/// Ledger kept in a `HashMap`. Nothing survives the process.
#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<HashMap<UserId, StoredUser>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored copy of one user, if any.
    pub fn get(&self, id: UserId) -> Option<StoredUser> {
        self.rows.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

impl LedgerStore for MemoryLedger {
    fn upsert(&self, user: &StoredUser) -> Result<(), StoreError> {
        self.rows.lock().insert(user.id, user.clone());
        Ok(())
    }

    fn delete(&self, id: UserId) -> Result<(), StoreError> {
        self.rows.lock().remove(&id);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<StoredUser>, StoreError> {
        Ok(self.rows.lock().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRecord;

    #[test]
    fn upsert_replaces_and_delete_is_idempotent() {
        let ledger = MemoryLedger::new();
        let mut rec = UserRecord::new(UserId(1), "a");
        ledger.upsert(&rec.to_stored()).unwrap();
        rec.balance = 40;
        ledger.upsert(&rec.to_stored()).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(UserId(1)).unwrap().balance, 40);

        ledger.delete(UserId(1)).unwrap();
        ledger.delete(UserId(1)).unwrap();
        assert!(ledger.is_empty());
    }
}
