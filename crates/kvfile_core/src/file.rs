//! The virtual file engine.
//!
//! [`VirtualFile`] presents a seekable, randomly-readable byte stream with
//! POSIX stream semantics - element-aligned partial reads, explicit EOF,
//! relative/absolute/end-relative seeks - over pages stored independently
//! in a key-value store.
//!
//! Every read and write runs inside one store transaction, so a
//! multi-page operation is observed in full or not at all. Across
//! separate calls the only guarantee is that a read observes the most
//! recently committed write.
//!
//! A handle is a single logical stream: operations are expected to be
//! invoked sequentially by one caller. The engine does not serialize
//! concurrent calls on the same handle; that is the caller's
//! responsibility.

use crate::error::{FileError, FileResult};
use crate::meta::FileMetadata;
use crate::page::{file_key_range, page_key, PageCursor, MAX_PAGE_COUNT, PAGE_SIZE};
use kvfile_storage::{KeyRange, StoreAdapter, TransactionMode};
use tracing::{debug, trace};

/// Access mode of a handle, fixed at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Reads only; writes fail with [`FileError::ReadOnly`].
    ReadOnly,
    /// Reads and writes.
    ReadWrite,
}

impl OpenMode {
    /// Derives the mode from an `fopen`-style mode string.
    ///
    /// A string containing `'r'` opens read-only; anything else opens
    /// read-write. Note the consequence: `"rw"` contains `'r'` and
    /// therefore opens read-only.
    #[must_use]
    pub fn from_mode_str(mode: &str) -> Self {
        if mode.contains('r') {
            Self::ReadOnly
        } else {
            Self::ReadWrite
        }
    }

    /// Whether writes are forbidden.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

/// Base position of a seek.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// From the start of the file (`SEEK_SET`).
    Start,
    /// From the current position (`SEEK_CUR`).
    Current,
    /// From the end of the file (`SEEK_END`).
    End,
}

impl Whence {
    /// Converts a raw POSIX whence value.
    ///
    /// # Errors
    ///
    /// Fails with [`FileError::InvalidArgument`] for anything other than
    /// 0, 1, or 2.
    pub fn from_raw(raw: i32) -> FileResult<Self> {
        match raw {
            0 => Ok(Self::Start),
            1 => Ok(Self::Current),
            2 => Ok(Self::End),
            other => Err(FileError::invalid_argument(format!(
                "unrecognized whence value {other}"
            ))),
        }
    }
}

/// An open virtual file: a stream cursor over paged key-value storage.
///
/// A handle exclusively owns one store connection for its lifetime;
/// [`close`](VirtualFile::close) releases it, after which operations that
/// reach the store fail with [`FileError::Closed`].
///
/// The cached metadata is a snapshot taken at open and refreshed only by
/// this handle's own writes and removes. The handle-local
/// [`exists`](VirtualFile::exists) reflects that snapshot; use the
/// free function [`exists`](crate::exists) for an authoritative check
/// against the store.
///
/// # Example
///
/// ```rust
/// use kvfile_core::{OpenMode, VirtualFile, Whence};
/// use kvfile_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// let mut file =
///     VirtualFile::open(Box::new(store.clone()), "model.bin", OpenMode::ReadWrite).unwrap();
/// file.write(b"weights", 1).unwrap();
/// file.seek(0, Whence::Start).unwrap();
/// assert_eq!(file.read(1, 7).unwrap(), b"weights");
/// ```
pub struct VirtualFile {
    path: String,
    mode: OpenMode,
    metadata: Option<FileMetadata>,
    cursor: PageCursor,
    store: Option<Box<dyn StoreAdapter>>,
}

impl VirtualFile {
    /// Opens a handle for `path`, taking ownership of a store connection.
    ///
    /// Fetches the metadata record in a read transaction. Opening a
    /// nonexistent path read-write is valid and means create on first
    /// write; opening one read-only fails.
    ///
    /// # Errors
    ///
    /// - [`FileError::NotFound`] - read-only open and no metadata exists
    /// - [`FileError::Store`] - the store failed the lookup
    pub fn open(
        store: Box<dyn StoreAdapter>,
        path: impl Into<String>,
        mode: OpenMode,
    ) -> FileResult<Self> {
        let path = path.into();
        let metadata = fetch_metadata(store.as_ref(), &path)?;

        if metadata.is_none() && mode.is_read_only() {
            return Err(FileError::not_found(path));
        }

        debug!(path = %path, ?mode, exists = metadata.is_some(), "opened file");

        Ok(Self {
            path,
            mode,
            metadata,
            cursor: PageCursor::START,
            store: Some(store),
        })
    }

    /// The path this handle was opened on.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The access mode fixed at open time.
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Releases the store connection.
    ///
    /// After this, `read`, `write`, `seek`, and `remove` fail with
    /// [`FileError::Closed`]. `tell` and the snapshot `exists` stay
    /// usable; they never touch the store. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.store.take().is_some() {
            debug!(path = %self.path, "closed file");
        }
    }

    /// The current stream position in bytes.
    ///
    /// Pure function of the cursor; never fails, never touches the store.
    #[must_use]
    pub fn tell(&self) -> u64 {
        self.cursor.to_offset()
    }

    /// Whether this handle's cached snapshot says the file exists.
    ///
    /// Reflects the state as of open and this handle's own writes and
    /// removes, not concurrent changes through other connections.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.metadata.is_some()
    }

    /// Reads up to `element_count` elements of `element_size` bytes.
    ///
    /// The request is capped at the file size and truncated down to a
    /// whole number of elements, then satisfied from the cursor forward,
    /// crossing page boundaries as needed in one ascending range scan
    /// inside one read transaction. Returns the bytes copied - fewer
    /// than requested when EOF arrives mid-copy - and never zero-pads.
    ///
    /// # Errors
    ///
    /// - [`FileError::Closed`] - the handle was closed
    /// - [`FileError::NotFound`] - no metadata (never written or removed)
    /// - [`FileError::EndOfFile`] - the cursor was already at or beyond
    ///   EOF when the call was made (a partial read that *reaches* EOF
    ///   does not fail; the next call does)
    /// - [`FileError::Corrupted`] - a page the metadata declares is
    ///   missing from the store
    pub fn read(&mut self, element_size: usize, element_count: usize) -> FileResult<Vec<u8>> {
        let store = self.store()?;
        let meta = self.require_metadata()?;

        if self.cursor.to_offset() >= meta.size {
            return Err(FileError::EndOfFile);
        }

        let requested = (element_size as u64).saturating_mul(element_count as u64);
        let max_bytes = requested.min(meta.size);
        let num_bytes = if element_size == 0 {
            0
        } else {
            max_bytes - max_bytes % element_size as u64
        };
        if num_bytes == 0 {
            return Ok(Vec::new());
        }

        let last_page = meta.page_count.saturating_sub(1);
        let range = KeyRange::bounded(
            page_key(&self.path, self.cursor.page_index),
            page_key(&self.path, last_page),
        );

        let mut txn = store.begin(TransactionMode::ReadOnly)?;
        let pages = txn.scan(&range)?;
        txn.commit()?;

        let mut out = Vec::with_capacity(num_bytes as usize);
        let mut cursor = self.cursor;

        for (key, content) in &pages {
            if out.len() as u64 >= num_bytes {
                break;
            }

            // A gap in the scan means a page the metadata declares is
            // gone; copying from the wrong page would silently corrupt
            // the stream.
            let expected = page_key(&self.path, cursor.page_index);
            if *key != expected {
                return Err(FileError::corrupted(format!("missing page {expected}")));
            }

            let intra = cursor.intra_offset as usize;
            if intra >= content.len() {
                // Short final page: nothing left past the content.
                break;
            }

            let wanted = (num_bytes - out.len() as u64) as usize;
            let take = wanted.min(content.len() - intra);
            out.extend_from_slice(&content[intra..intra + take]);

            // intra_offset resets to 0 and page_index increments exactly
            // when the copy reaches the page boundary.
            cursor = PageCursor::from_offset(cursor.to_offset() + take as u64);
        }

        self.cursor = cursor;
        trace!(path = %self.path, bytes = out.len(), position = self.tell(), "read");
        Ok(out)
    }

    /// Replaces the entire file with `content`.
    ///
    /// In one read-write transaction: deletes the full prior key range
    /// (when the file already existed), writes the new metadata record,
    /// then the pages split from `content` in order. No partial or
    /// offset writes exist; orphan pages never survive a shrink.
    ///
    /// The cursor is **not** reset: it advances forward by
    /// `content.len()` from wherever it was, so repeated writes
    /// accumulate `tell()`. Callers that want to read back from the
    /// start must seek explicitly.
    ///
    /// # Errors
    ///
    /// - [`FileError::Closed`] - the handle was closed
    /// - [`FileError::ReadOnly`] - the handle is read-only
    /// - [`FileError::InvalidVersion`] - `version <= 0`
    /// - [`FileError::TooLarge`] - `content` needs more than
    ///   [`MAX_PAGE_COUNT`] pages
    /// - [`FileError::Store`] - the transaction failed; prior state is
    ///   left intact
    pub fn write(&mut self, content: &[u8], version: i64) -> FileResult<()> {
        let store = self.store()?;

        if self.mode.is_read_only() {
            return Err(FileError::ReadOnly);
        }
        if version <= 0 {
            return Err(FileError::InvalidVersion { version });
        }

        let meta = FileMetadata::for_content(content.len() as u64, version);
        if meta.page_count > MAX_PAGE_COUNT {
            return Err(FileError::TooLarge {
                page_count: meta.page_count,
                max_page_count: MAX_PAGE_COUNT,
            });
        }

        let mut txn = store.begin(TransactionMode::ReadWrite)?;
        if let Some(prior) = self.metadata {
            txn.delete_range(&file_key_range(&self.path, prior.page_count))?;
        }
        txn.put(&self.path, &meta.encode())?;
        for (index, chunk) in content.chunks(PAGE_SIZE as usize).enumerate() {
            txn.put(&page_key(&self.path, index as u32), chunk)?;
        }
        txn.commit()?;

        self.metadata = Some(meta);
        self.cursor = PageCursor::from_offset(self.cursor.to_offset() + content.len() as u64);

        debug!(
            path = %self.path,
            size = meta.size,
            page_count = meta.page_count,
            "replaced file content"
        );
        Ok(())
    }

    /// Moves the cursor.
    ///
    /// The target - `offset` from the start, from the current position,
    /// or from the end, per `whence` - is clamped to `[0, size]` and the
    /// cursor recomputed through the page codec. `offset` must be
    /// non-negative for every whence; combined with clamping, only
    /// forward positions are reachable from [`Whence::Current`].
    ///
    /// # Errors
    ///
    /// - [`FileError::Closed`] - the handle was closed
    /// - [`FileError::NotFound`] - no metadata to bound the seek
    /// - [`FileError::EndOfFile`] - `offset` is negative (the engine
    ///   reuses the EOF error kind for this rejection)
    pub fn seek(&mut self, offset: i64, whence: Whence) -> FileResult<()> {
        self.store()?;
        let meta = self.require_metadata()?;

        if offset < 0 {
            return Err(FileError::EndOfFile);
        }
        let offset = offset as u64;

        let base = match whence {
            Whence::Start => 0,
            Whence::Current => self.tell(),
            Whence::End => meta.size,
        };
        let target = base.saturating_add(offset).min(meta.size);

        self.cursor = PageCursor::from_offset(target);
        trace!(path = %self.path, position = target, "seek");
        Ok(())
    }

    /// Deletes the file: metadata and every page, in one transaction.
    ///
    /// Clears the cached metadata on success; subsequent operations that
    /// require it fail with [`FileError::NotFound`] until a new `write`.
    /// The handle itself stays open.
    ///
    /// # Errors
    ///
    /// - [`FileError::Closed`] - the handle was closed
    /// - [`FileError::NotFound`] - no metadata exists
    /// - [`FileError::Store`] - the transaction failed
    pub fn remove(&mut self) -> FileResult<()> {
        let store = self.store()?;
        let meta = self.require_metadata()?;

        let mut txn = store.begin(TransactionMode::ReadWrite)?;
        txn.delete_range(&file_key_range(&self.path, meta.page_count))?;
        txn.commit()?;

        self.metadata = None;
        debug!(path = %self.path, "removed file");
        Ok(())
    }

    fn store(&self) -> FileResult<&dyn StoreAdapter> {
        self.store.as_deref().ok_or(FileError::Closed)
    }

    fn require_metadata(&self) -> FileResult<FileMetadata> {
        self.metadata
            .ok_or_else(|| FileError::not_found(self.path.clone()))
    }
}

impl std::fmt::Debug for VirtualFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFile")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("metadata", &self.metadata)
            .field("position", &self.tell())
            .field("closed", &self.store.is_none())
            .finish()
    }
}

/// Authoritative existence check: a fresh metadata lookup against the
/// store, independent of any handle's cached snapshot.
///
/// # Errors
///
/// Fails if the store lookup fails or the stored record is corrupt.
pub fn exists(store: &dyn StoreAdapter, path: &str) -> FileResult<bool> {
    Ok(fetch_metadata(store, path)?.is_some())
}

fn fetch_metadata(store: &dyn StoreAdapter, path: &str) -> FileResult<Option<FileMetadata>> {
    let mut txn = store.begin(TransactionMode::ReadOnly)?;
    let raw = txn.get(path)?;
    txn.commit()?;

    match raw {
        Some(bytes) => Ok(Some(FileMetadata::decode(&bytes)?)),
        None => Ok(None),
    }
}
