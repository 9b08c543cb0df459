//! Transactional in-memory store adapter.

use crate::adapter::{KeyRange, StoreAdapter, StoreTransaction, TransactionMode};
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// An in-memory store adapter.
///
/// Keys live in a [`BTreeMap`], so scans iterate in lexicographic order.
/// Transactions buffer their mutations and apply them under a single
/// write-lock acquisition on commit, giving the all-or-nothing visibility
/// the file engine requires. A dropped transaction is an abort.
///
/// This adapter is suitable for:
/// - Unit and integration tests
/// - Ephemeral in-process files that don't need persistence
///
/// # Connections
///
/// `Clone` hands out a new connection to the same shared store, the way a
/// browser key-value store hands each caller its own connection. State
/// committed through one connection is visible through every clone.
///
/// # Example
///
/// ```rust
/// use kvfile_storage::{MemoryStore, StoreAdapter, StoreTransaction, TransactionMode};
///
/// let store = MemoryStore::new();
/// let mut txn = store.begin(TransactionMode::ReadWrite).unwrap();
/// txn.put("k", b"v").unwrap();
/// txn.commit().unwrap();
/// assert_eq!(store.key_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys currently committed.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns all committed keys in ascending order.
    ///
    /// Useful for asserting on persisted layout in tests.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }
}

impl StoreAdapter for MemoryStore {
    fn begin(&self, mode: TransactionMode) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        Ok(Box::new(MemoryTransaction {
            store: self,
            mode,
            pending: Vec::new(),
        }))
    }
}

/// A buffered mutation awaiting commit.
#[derive(Debug)]
enum PendingOp {
    Put { key: String, value: Vec<u8> },
    DeleteRange(KeyRange),
}

struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    mode: TransactionMode,
    pending: Vec<PendingOp>,
}

impl MemoryTransaction<'_> {
    fn check_writable(&self) -> StoreResult<()> {
        match self.mode {
            TransactionMode::ReadWrite => Ok(()),
            TransactionMode::ReadOnly => Err(StoreError::ReadOnlyTransaction),
        }
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn get(&mut self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        // Pending mutations shadow committed state, newest first.
        for op in self.pending.iter().rev() {
            match op {
                PendingOp::Put { key: k, value } if k == key => {
                    return Ok(Some(value.clone()));
                }
                PendingOp::DeleteRange(range) if range.contains(key) => {
                    return Ok(None);
                }
                _ => {}
            }
        }
        Ok(self.store.inner.read().get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.check_writable()?;
        self.pending.push(PendingOp::Put {
            key: key.to_string(),
            value: value.to_vec(),
        });
        Ok(())
    }

    fn delete_range(&mut self, range: &KeyRange) -> StoreResult<()> {
        self.check_writable()?;
        self.pending.push(PendingOp::DeleteRange(range.clone()));
        Ok(())
    }

    fn scan(&mut self, range: &KeyRange) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let mut view: BTreeMap<String, Vec<u8>> = {
            let map = self.store.inner.read();
            map.range::<str, _>((
                Bound::Included(range.lower()),
                Bound::Included(range.upper()),
            ))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
        };

        // Replay pending mutations over the committed snapshot in order.
        for op in &self.pending {
            match op {
                PendingOp::Put { key, value } => {
                    if range.contains(key) {
                        view.insert(key.clone(), value.clone());
                    }
                }
                PendingOp::DeleteRange(deleted) => {
                    view.retain(|k, _| !deleted.contains(k));
                }
            }
        }

        Ok(view.into_iter().collect())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let this = *self;
        if this.pending.is_empty() {
            return Ok(());
        }

        let mut map = this.store.inner.write();
        for op in this.pending {
            match op {
                PendingOp::Put { key, value } => {
                    map.insert(key, value);
                }
                PendingOp::DeleteRange(range) => {
                    map.retain(|k, _| !range.contains(k));
                }
            }
        }
        Ok(())
    }
}
