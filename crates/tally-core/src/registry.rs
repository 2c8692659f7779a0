//! User registry: the in-memory source of truth for user records, kept in
//! step with a [`LedgerStore`].
//!
//! Reads hit memory only. Changes to persisted fields go through
//! [`Registry::commit`], which writes the record to the store first and only
//! then replaces the in-memory copy, so memory is never ahead of the store
//! for balances or invites. Ephemeral fields (subscription cache, pending
//! selections) are edited in place with [`Registry::get_mut`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::traits::LedgerStore;
use crate::types::{UserId, UserRecord};

pub struct Registry {
    users: HashMap<UserId, UserRecord>,
    store: Arc<dyn LedgerStore>,
    persist_attempts: u32,
}

impl Registry {
    /// Load every stored record into memory.
    pub fn load(store: Arc<dyn LedgerStore>, persist_attempts: u32) -> Result<Self, StoreError> {
        let users: HashMap<UserId, UserRecord> = store
            .load_all()?
            .into_iter()
            .map(|stored| (stored.id, UserRecord::from_stored(stored)))
            .collect();
        debug!(count = users.len(), "registry loaded");
        Ok(Self {
            users,
            store,
            persist_attempts: persist_attempts.max(1),
        })
    }

    pub fn get(&self, id: UserId) -> Option<&UserRecord> {
        self.users.get(&id)
    }

    /// Mutable access for ephemeral fields. Balance and invite changes must
    /// go through [`commit`](Self::commit) instead.
    pub fn get_mut(&mut self, id: UserId) -> Option<&mut UserRecord> {
        self.users.get_mut(&id)
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Return the record for `id`, creating it on first contact. The display
    /// name is refreshed when a non-empty one is supplied.
    pub fn ensure(&mut self, id: UserId, display_name: &str) -> &mut UserRecord {
        let record = self
            .users
            .entry(id)
            .or_insert_with(|| UserRecord::new(id, display_name));
        if !display_name.is_empty() && record.display_name != display_name {
            record.display_name = display_name.to_string();
        }
        record
    }

    /// All user ids in ascending order.
    pub fn ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All records in ascending id order.
    pub fn sorted(&self) -> Vec<&UserRecord> {
        let mut records: Vec<&UserRecord> = self.users.values().collect();
        records.sort_unstable_by_key(|r| r.id);
        records
    }

    /// Persist `record` and make it the in-memory copy.
    pub fn commit(&mut self, mut record: UserRecord) -> Result<(), StoreError> {
        let stored = record.to_stored();
        self.with_retry("upsert", record.id, |store| store.upsert(&stored))?;
        record.stored = true;
        self.users.insert(record.id, record);
        Ok(())
    }

    /// Persist several records, then install all of them in memory.
    ///
    /// If a later write fails, earlier writes stay in the store but memory
    /// is left untouched; the caller reports the error.
    pub fn commit_all(&mut self, records: Vec<UserRecord>) -> Result<(), StoreError> {
        for record in &records {
            let stored = record.to_stored();
            self.with_retry("upsert", record.id, |store| store.upsert(&stored))?;
        }
        for mut record in records {
            record.stored = true;
            self.users.insert(record.id, record);
        }
        Ok(())
    }

    /// Delete a user from the store and then from memory.
    pub fn remove(&mut self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        self.with_retry("delete", id, |store| store.delete(id))?;
        Ok(self.users.remove(&id))
    }

    fn with_retry(
        &self,
        op: &'static str,
        id: UserId,
        mut write: impl FnMut(&dyn LedgerStore) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut attempt = 1;
        loop {
            match write(self.store.as_ref()) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.persist_attempts => {
                    warn!(%id, op, attempt, error = %e, "ledger write failed, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    warn!(%id, op, attempt, error = %e, "ledger write failed, giving up");
                    return Err(e);
                }
            }
        }
    }
}
