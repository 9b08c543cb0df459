//! # kvfile Core
//!
//! Paged virtual file engine over key-value storage.
//!
//! kvfile gives a WebAssembly module compiled from C - code that expects
//! POSIX `fopen`/`fread`/`fwrite`/`fseek`/`ftell` semantics - a place to
//! persist byte streams when no native filesystem exists. A file's
//! content is split into fixed-size pages, each stored under its own key
//! in a host-provided key-value store; a small metadata record under the
//! bare path key is the source of truth for length and page count.
//!
//! This crate provides:
//! - [`VirtualFile`] - the seekable stream engine:
//!   open/read/write/seek/tell/remove/exists/close
//! - [`PageCursor`] and the page key scheme - offset/page arithmetic
//! - [`FileMetadata`] - the persisted metadata record
//! - [`HandleRegistry`] - an arena mapping opaque integer handles to
//!   open files, for bridges marshalling across a linear-memory boundary
//!
//! The store itself is injected through
//! [`kvfile_storage::StoreAdapter`]; tests and in-process callers use
//! [`kvfile_storage::MemoryStore`], browsers supply an IndexedDB-backed
//! adapter host-side.
//!
//! ## Example
//!
//! ```rust
//! use kvfile_core::{OpenMode, VirtualFile, Whence};
//! use kvfile_storage::MemoryStore;
//!
//! let store = MemoryStore::new();
//!
//! let mut file =
//!     VirtualFile::open(Box::new(store.clone()), "model.bin", OpenMode::ReadWrite).unwrap();
//! file.write(b"weights", 1).unwrap();
//! file.seek(0, Whence::Start).unwrap();
//! assert_eq!(file.read(1, 7).unwrap(), b"weights");
//! file.close();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod meta;
mod page;
mod registry;

pub use error::{FileError, FileResult};
pub use file::{exists, OpenMode, VirtualFile, Whence};
pub use meta::{FileMetadata, META_FORMAT_VERSION, META_MAGIC};
pub use page::{
    file_key_range, page_key, PageCursor, MAX_PAGE_COUNT, PAGE_INDEX_DIGITS, PAGE_SIZE,
};
pub use registry::{HandleId, HandleRegistry};
