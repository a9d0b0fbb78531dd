//! Durable persistence seam.
//!
//! Profiles and provider registrations are durably stored by an external
//! configuration/database collaborator. This core only depends on
//! load-at-start / save-on-write semantics over string blobs, expressed by
//! [`KeyValueStore`]. [`MemoryStore`] is the in-process implementation used
//! in tests and single-instance deployments.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::error::StoreError;

/// Get/put/list key-value persistence collaborator.
///
/// Keys are flat strings; callers namespace with prefixes (`profile/`,
/// `provider/`). Values are opaque blobs, JSON by convention.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys starting with `prefix`, in lexicographic order.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// In-memory [`KeyValueStore`].
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .lock()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValueStore, MemoryStore};

    #[test]
    fn list_is_prefix_scoped_and_ordered() {
        let store = MemoryStore::new();
        store.put("profile/b", "{}").unwrap();
        store.put("profile/a", "{}").unwrap();
        store.put("provider/x", "{}").unwrap();

        let keys = store.list("profile/").unwrap();
        assert_eq!(keys, vec!["profile/a", "profile/b"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = MemoryStore::new();
        store.put("k", "v").unwrap();
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
