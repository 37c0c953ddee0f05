//! In-memory key-value store with an optional byte quota.
//!
//! Mirrors browser-style storage limits: the quota covers the UTF-8 length of
//! every key plus every value.

use super::{KvStore, StoreError, StoreResult};
use std::cell::RefCell;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKvStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store rejecting writes that would push usage past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RefCell::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Current usage in bytes (keys + values).
    pub fn used_bytes(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if let Some(quota_bytes) = self.quota_bytes {
            let replaced = self
                .entries
                .borrow()
                .get(key)
                .map_or(0, |old| key.len() + old.len());
            let required_bytes = self.used_bytes() - replaced + key.len() + value.len();
            if required_bytes > quota_bytes {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    required_bytes,
                    quota_bytes,
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKvStore;
    use crate::store::{KvStore, StoreError};

    #[test]
    fn quota_rejects_oversized_write_and_keeps_previous_value() {
        let store = MemoryKvStore::with_quota(8);
        store.set("k", "abc").expect("fits in quota");

        let err = store.set("k", "abcdefgh").expect_err("over quota");
        assert!(matches!(err, StoreError::QuotaExceeded { quota_bytes: 8, .. }));
        assert_eq!(store.get("k").expect("get").as_deref(), Some("abc"));
    }

    #[test]
    fn replacing_a_value_frees_its_old_bytes() {
        let store = MemoryKvStore::with_quota(6);
        store.set("k", "abcde").expect("exactly at quota");
        store.set("k", "vwxyz").expect("same size replacement");
        assert_eq!(store.used_bytes(), 6);
    }
}
