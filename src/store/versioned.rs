//! Reader/writer-locked versioned map

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use super::{DataStore, KeyVersion, TransactionalStore, VersionConflict, VersionedValue};
use crate::command::{ReadOp, WriteOp};

/// Thread-safe in-memory store.
///
/// Gets share the lock; Set, Delete and commits take it exclusively.
/// Created empty at node start and rebuilt from the WAL, never global.
#[derive(Debug, Default)]
pub struct VersionedStore {
    data: RwLock<HashMap<String, VersionedValue>>,
}

impl VersionedStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Consistent, key-ordered copy of the whole store.
    pub fn snapshot(&self) -> BTreeMap<String, VersionedValue> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn write_locked(data: &mut HashMap<String, VersionedValue>, key: &str, value: &str) -> u64 {
    let version = data.get(key).map_or(0, |current| current.version) + 1;
    data.insert(
        key.to_string(),
        VersionedValue {
            value: value.to_string(),
            version,
        },
    );
    version
}

impl DataStore for VersionedStore {
    fn get(&self, key: &str) -> Option<VersionedValue> {
        self.data.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> u64 {
        write_locked(&mut self.data.write(), key, value)
    }

    fn delete(&self, key: &str) {
        self.data.write().remove(key);
    }
}

impl TransactionalStore for VersionedStore {
    fn commit_if_current(
        &self,
        read_set: &[ReadOp],
        write_set: &[WriteOp],
    ) -> Result<Vec<KeyVersion>, VersionConflict> {
        let mut data = self.data.write();

        for read in read_set {
            let actual = data.get(&read.key).map_or(0, |v| v.version);
            if actual != read.version {
                return Err(VersionConflict {
                    key: read.key.clone(),
                    expected: read.version,
                    actual,
                });
            }
        }

        Ok(write_set
            .iter()
            .map(|write| KeyVersion {
                key: write.key.clone(),
                version: write_locked(&mut data, &write.key, &write.value),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_missing_key_is_not_found() {
        let store = VersionedStore::new();
        assert!(store.get("nope").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_versions_start_at_one_and_increment() {
        let store = VersionedStore::new();
        assert_eq!(store.set("k", "v1"), 1);
        assert_eq!(store.set("k", "v2"), 2);
        assert_eq!(store.set("k", "v3"), 3);

        let current = store.get("k").unwrap();
        assert_eq!(current.value, "v3");
        assert_eq!(current.version, 3);
    }

    #[test]
    fn test_mykey_lifecycle() {
        let store = VersionedStore::new();

        store.set("mykey", "hello world");
        assert_eq!(
            store.get("mykey"),
            Some(VersionedValue {
                value: "hello world".to_string(),
                version: 1
            })
        );

        store.delete("mykey");
        assert!(store.get("mykey").is_none());

        assert_eq!(store.set("mykey", "again"), 1);
    }

    #[test]
    fn test_delete_absent_key_is_noop() {
        let store = VersionedStore::new();
        store.delete("ghost");
        assert!(store.is_empty());
    }

    #[test]
    fn test_commit_applies_all_writes_in_order() {
        let store = VersionedStore::new();
        store.set("a", "old");

        let versions = store
            .commit_if_current(
                &[ReadOp::new("a", 1)],
                &[
                    WriteOp::new("a", "first"),
                    WriteOp::new("b", "2"),
                    WriteOp::new("a", "last"),
                ],
            )
            .unwrap();

        assert_eq!(
            versions,
            vec![
                KeyVersion { key: "a".into(), version: 2 },
                KeyVersion { key: "b".into(), version: 1 },
                KeyVersion { key: "a".into(), version: 3 },
            ]
        );
        assert_eq!(store.get("a").unwrap().value, "last");
    }

    #[test]
    fn test_commit_rejects_stale_read() {
        let store = VersionedStore::new();
        store.set("x", "v1");
        store.set("x", "v2");

        let err = store
            .commit_if_current(&[ReadOp::new("x", 1)], &[WriteOp::new("x", "mine")])
            .unwrap_err();

        assert_eq!(
            err,
            VersionConflict {
                key: "x".into(),
                expected: 1,
                actual: 2
            }
        );
        assert_eq!(store.get("x").unwrap().value, "v2");
    }

    #[test]
    fn test_commit_rejects_key_created_after_absent_read() {
        let store = VersionedStore::new();
        store.set("x", "appeared");

        let err = store
            .commit_if_current(&[ReadOp::new("x", 0)], &[WriteOp::new("y", "1")])
            .unwrap_err();
        assert_eq!(err.actual, 1);
        assert!(store.get("y").is_none());
    }

    #[test]
    fn test_commit_rejects_key_deleted_after_read() {
        let store = VersionedStore::new();
        store.set("x", "v");
        store.delete("x");

        let err = store
            .commit_if_current(&[ReadOp::new("x", 1)], &[WriteOp::new("x", "w")])
            .unwrap_err();
        assert_eq!(err.actual, 0);
    }

    #[test]
    fn test_snapshot_is_key_ordered() {
        let store = VersionedStore::new();
        store.set("b", "2");
        store.set("a", "1");

        let keys: Vec<_> = store.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let store = Arc::new(VersionedStore::new());
        store.set("initial_key", "initial_value");

        let handles: Vec<_> = (0..16)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..200 {
                        let key = format!("key_{}_{}", t, j);
                        if j % 2 == 0 {
                            store.set(&key, "some_value");
                        } else {
                            let _ = store.get("initial_key");
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1 + 16 * 100);
        assert_eq!(store.get("initial_key").unwrap().version, 1);
    }

    #[test]
    fn test_concurrent_sets_on_one_key_count_every_write() {
        let store = Arc::new(VersionedStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..250 {
                        store.set("hot", "x");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get("hot").unwrap().version, 2000);
    }
}
