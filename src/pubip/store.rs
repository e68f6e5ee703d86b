/**
 * Per-account registry of the last known public address.
 *
 * This is the only mutable state of the module. All access goes through a single
 * mutex which is held for the in-memory operation only.
 */
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::ua::AccountId;

use super::addr::ExternalAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    external: Option<ExternalAddr>,
    enabled: bool,
}

impl Entry {
    fn new() -> Self {
        Self {
            external: None,
            enabled: true,
        }
    }
}

/**
 * Returned by `register`.
 *
 * Fields:
 * - `account`: the key of the entry
 * - `created`: false when the account was already registered
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHandle {
    pub account: AccountId,
    pub created: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    Changed { previous: Option<ExternalAddr> },
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no entry registered for {0}")]
    NotFound(AccountId),
}

#[derive(Debug, Default)]
pub struct AccountStore {
    entries: Mutex<HashMap<AccountId, Entry>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<AccountId, Entry>> {
        // entries are plain values, a panic elsewhere cannot leave one half-written
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /**
     * Create an entry for the account unless one exists already. An existing
     * address is left untouched.
     */
    pub fn register(&self, account: AccountId) -> EntryHandle {
        let mut entries = self.lock();
        let created = !entries.contains_key(&account);
        entries.entry(account).or_insert_with(Entry::new);
        EntryHandle { account, created }
    }

    /**
     * Remove the entry of the account, if any.
     *
     * @return true if an entry was removed
     */
    pub fn unregister(&self, account: AccountId) -> bool {
        self.lock().remove(&account).is_some()
    }

    pub fn get(&self, account: AccountId) -> Option<ExternalAddr> {
        self.lock().get(&account).and_then(|entry| entry.external)
    }

    #[cfg(test)]
    pub fn is_enabled(&self, account: AccountId) -> Option<bool> {
        self.lock().get(&account).map(|entry| entry.enabled)
    }

    #[cfg(test)]
    pub fn set_enabled(&self, account: AccountId, enabled: bool) -> Result<(), StoreError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&account)
            .ok_or(StoreError::NotFound(account))?;
        entry.enabled = enabled;
        Ok(())
    }

    /**
     * Replace the stored address if the candidate names a different host.
     *
     * Only the IP is compared. A disabled entry is never changed.
     *
     * @param account The owning account
     * @param candidate The freshly decoded address
     * @return `Changed` with the previous value, `Unchanged`, or `NotFound` if the account has no entry
     */
    pub fn compare_and_set(
        &self,
        account: AccountId,
        candidate: &ExternalAddr,
    ) -> Result<CasOutcome, StoreError> {
        let mut entries = self.lock();
        let entry = entries
            .get_mut(&account)
            .ok_or(StoreError::NotFound(account))?;

        if !entry.enabled {
            return Ok(CasOutcome::Unchanged);
        }

        match entry.external {
            Some(current) if current.same_host(candidate) => Ok(CasOutcome::Unchanged),
            previous => {
                entry.external = Some(*candidate);
                Ok(CasOutcome::Changed { previous })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// drop every entry, used when the module stops
    pub fn clear(&self) {
        self.lock().clear();
    }
}
