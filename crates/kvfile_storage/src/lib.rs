//! # kvfile Storage
//!
//! Store adapter trait and implementations for kvfile.
//!
//! This crate provides the lowest-level storage abstraction for kvfile.
//! Store adapters are **ordered key-value stores with transactions** -
//! they do not interpret the values they hold.
//!
//! ## Design Principles
//!
//! - Adapters expose exactly the capability set the file engine needs:
//!   get, put, range deletion, and ascending range scans
//! - Every operation runs inside a transaction scope that either commits
//!   all of its mutations or none of them
//! - Keys iterate in lexicographic order; the engine relies on this for
//!   page ordering
//! - kvfile owns all record interpretation
//!
//! ## Available Adapters
//!
//! - [`MemoryStore`] - Transactional in-memory store for testing and
//!   in-process use. Browser-backed adapters (IndexedDB) live host-side
//!   and implement the same traits.
//!
//! ## Example
//!
//! ```rust
//! use kvfile_storage::{MemoryStore, StoreAdapter, StoreTransaction, TransactionMode};
//!
//! let store = MemoryStore::new();
//! let mut txn = store.begin(TransactionMode::ReadWrite).unwrap();
//! txn.put("greeting", b"hello").unwrap();
//! txn.commit().unwrap();
//!
//! let mut txn = store.begin(TransactionMode::ReadOnly).unwrap();
//! assert_eq!(txn.get("greeting").unwrap(), Some(b"hello".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod error;
mod memory;

pub use adapter::{KeyRange, StoreAdapter, StoreTransaction, TransactionMode};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
