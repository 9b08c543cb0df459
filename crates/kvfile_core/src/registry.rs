//! Handle registry: an arena bridging foreign callers to open files.
//!
//! A caller on the far side of a linear-memory boundary cannot hold a
//! [`VirtualFile`] - it holds an opaque integer. The registry owns the
//! handles and maps those integers to them, with an explicit lifecycle:
//! insert on open, remove on close.
//!
//! The registry does no locking. Single-threaded access - per handle and
//! per registry - is the host bridge's responsibility; wrap the registry
//! in a lock if the host dispatches from more than one thread.

use crate::file::VirtualFile;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Opaque identifier for a registered file handle.
///
/// Ids are assigned in insertion order and never reused within one
/// registry, so a stale id from a closed handle can never alias a newer
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u32);

impl HandleId {
    /// Creates a handle id from its raw value.
    #[must_use]
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle:{}", self.0)
    }
}

/// Arena of open file handles keyed by [`HandleId`].
#[derive(Debug, Default)]
pub struct HandleRegistry {
    files: HashMap<u32, VirtualFile>,
    next_id: u32,
}

impl HandleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an open file and returns its id.
    pub fn insert(&mut self, file: VirtualFile) -> HandleId {
        let id = self.next_id;
        self.next_id += 1;

        debug!(id, path = file.path(), "registered handle");
        self.files.insert(id, file);
        HandleId(id)
    }

    /// Borrows a registered file.
    #[must_use]
    pub fn get(&self, id: HandleId) -> Option<&VirtualFile> {
        self.files.get(&id.0)
    }

    /// Mutably borrows a registered file.
    #[must_use]
    pub fn get_mut(&mut self, id: HandleId) -> Option<&mut VirtualFile> {
        self.files.get_mut(&id.0)
    }

    /// Unregisters a file, closing it and releasing its connection.
    ///
    /// Returns `false` if the id was unknown (already closed, or never
    /// issued by this registry).
    pub fn close(&mut self, id: HandleId) -> bool {
        match self.files.remove(&id.0) {
            Some(mut file) => {
                file.close();
                debug!(id = id.0, "unregistered handle");
                true
            }
            None => false,
        }
    }

    /// Number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no handles are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
