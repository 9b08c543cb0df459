//! End-to-end stream semantics over a paged in-memory store.
//!
//! These tests exercise the POSIX-flavored contract a C caller relies
//! on: element-aligned partial reads, explicit EOF, clamped seeks, and
//! whole-file replacing writes that leave no stale pages behind.

use kvfile_core::{exists, page_key, FileError, OpenMode, VirtualFile, Whence, PAGE_SIZE};
use kvfile_storage::MemoryStore;
use proptest::prelude::*;

const PAGE: usize = PAGE_SIZE as usize;

/// Deterministic pseudo-random content (xorshift), so multi-page reads
/// can be byte-compared against the exact source.
fn pseudo_random_content(len: usize, mut seed: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        out.extend_from_slice(&seed.to_le_bytes());
    }
    out.truncate(len);
    out
}

fn open_rw(store: &MemoryStore, path: &str) -> VirtualFile {
    VirtualFile::open(Box::new(store.clone()), path, OpenMode::ReadWrite).unwrap()
}

#[test]
fn multi_page_roundtrip() {
    let store = MemoryStore::new();
    let content = pseudo_random_content(3 * PAGE + 17, 0xBEEF);

    let mut file = open_rw(&store, "blob");
    file.write(&content, 1).unwrap();
    file.seek(0, Whence::Start).unwrap();

    let bytes = file.read(1, content.len()).unwrap();
    assert_eq!(bytes, content);
    assert_eq!(file.tell(), content.len() as u64);
}

#[test]
fn reads_cross_page_boundaries_from_any_offset() {
    let store = MemoryStore::new();
    let content = pseudo_random_content(2 * PAGE + 100, 7);

    let mut file = open_rw(&store, "blob");
    file.write(&content, 1).unwrap();

    // Start 10 bytes shy of the first boundary and read across it.
    let start = PAGE - 10;
    file.seek(start as i64, Whence::Start).unwrap();
    let bytes = file.read(1, 20).unwrap();
    assert_eq!(bytes, &content[start..start + 20]);
    assert_eq!(file.tell(), (start + 20) as u64);
}

#[test]
fn element_aligned_read_truncates_to_whole_elements() {
    let store = MemoryStore::new();
    let content = pseudo_random_content(1024, 3);

    let mut file = open_rw(&store, "elems");
    file.write(&content, 1).unwrap();
    file.seek(0, Whence::Start).unwrap();

    // 1024 is not a multiple of 3: only 341 whole elements fit.
    let bytes = file.read(3, 999).unwrap();
    assert_eq!(bytes.len(), 1023);
    assert_eq!(bytes, &content[..1023]);
}

#[test]
fn eof_boundary_at_exact_page_multiple() {
    let store = MemoryStore::new();
    let content = pseudo_random_content(PAGE, 11);

    let mut file = open_rw(&store, "exact");
    file.write(&content, 1).unwrap();
    file.seek(0, Whence::Start).unwrap();

    // The full page must be readable...
    let bytes = file.read(1, PAGE).unwrap();
    assert_eq!(bytes, content);

    // ...and the very next read must raise, not return empty.
    assert!(matches!(file.read(1, 1), Err(FileError::EndOfFile)));
}

#[test]
fn eof_boundary_at_multi_page_multiple() {
    let store = MemoryStore::new();
    let content = pseudo_random_content(2 * PAGE, 13);

    let mut file = open_rw(&store, "exact2");
    file.write(&content, 1).unwrap();
    file.seek(0, Whence::Start).unwrap();

    assert_eq!(file.read(1, 2 * PAGE).unwrap(), content);
    assert!(matches!(file.read(1, 1), Err(FileError::EndOfFile)));
}

#[test]
fn partial_final_read_then_eof() {
    let store = MemoryStore::new();
    let content = pseudo_random_content(100, 17);

    let mut file = open_rw(&store, "partial");
    file.write(&content, 1).unwrap();
    file.seek(64, Whence::Start).unwrap();

    // More elements requested than remain: the call returns the 36
    // remaining bytes without raising.
    let bytes = file.read(1, 1000).unwrap();
    assert_eq!(bytes, &content[64..]);

    // Now exactly at EOF: the next call raises.
    assert!(matches!(file.read(1, 1), Err(FileError::EndOfFile)));
}

#[test]
fn seek_clamps_to_file_size() {
    let store = MemoryStore::new();
    let mut file = open_rw(&store, "clamp");
    file.write(&[0u8; 500], 1).unwrap();

    file.seek(600, Whence::Start).unwrap();
    assert_eq!(file.tell(), 500);

    file.seek(0, Whence::Start).unwrap();
    file.seek(10_000, Whence::Current).unwrap();
    assert_eq!(file.tell(), 500);

    file.seek(100, Whence::End).unwrap();
    assert_eq!(file.tell(), 500);
}

#[test]
fn seek_end_with_zero_offset_lands_on_size() {
    let store = MemoryStore::new();
    let mut file = open_rw(&store, "end");
    file.write(&[1u8; 123], 1).unwrap();

    file.seek(0, Whence::End).unwrap();
    assert_eq!(file.tell(), 123);
    assert!(matches!(file.read(1, 1), Err(FileError::EndOfFile)));
}

#[test]
fn negative_seek_is_rejected_for_every_whence() {
    let store = MemoryStore::new();
    let mut file = open_rw(&store, "neg");
    file.write(&[0u8; 10], 1).unwrap();
    file.seek(5, Whence::Start).unwrap();

    for whence in [Whence::Start, Whence::Current, Whence::End] {
        assert!(matches!(file.seek(-1, whence), Err(FileError::EndOfFile)));
    }
    // The failed seeks left the cursor alone.
    assert_eq!(file.tell(), 5);
}

#[test]
fn remove_then_exists_and_stale_handle() {
    let store = MemoryStore::new();
    let mut file = open_rw(&store, "doomed");
    file.write(&pseudo_random_content(PAGE + 5, 23), 1).unwrap();
    assert!(exists(&store, "doomed").unwrap());

    file.remove().unwrap();

    // The authoritative check and the stale handle agree: gone.
    assert!(!exists(&store, "doomed").unwrap());
    assert!(!file.exists());
    assert!(matches!(file.read(1, 1), Err(FileError::NotFound { .. })));
}

#[test]
fn shorter_overwrite_leaves_no_orphan_pages() {
    let store = MemoryStore::new();
    let long = pseudo_random_content(2 * PAGE + 50, 29);
    let short = pseudo_random_content(30, 31);

    let mut file = open_rw(&store, "shrink");
    file.write(&long, 1).unwrap();
    assert_eq!(store.key_count(), 4); // metadata + 3 pages

    file.write(&short, 2).unwrap();

    // Only the metadata record and one page survive.
    assert_eq!(
        store.keys(),
        vec!["shrink".to_string(), page_key("shrink", 0)]
    );

    // A read bounded by the new size never surfaces old tail bytes.
    file.seek(0, Whence::Start).unwrap();
    let bytes = file.read(1, long.len()).unwrap();
    assert_eq!(bytes, short);
}

#[test]
fn empty_file_reads_as_immediate_eof() {
    let store = MemoryStore::new();
    let mut file = open_rw(&store, "empty");
    file.write(b"", 1).unwrap();

    assert!(file.exists());
    assert_eq!(file.tell(), 0);
    assert_eq!(store.key_count(), 1); // metadata only, no pages
    assert!(matches!(file.read(1, 1), Err(FileError::EndOfFile)));
}

#[test]
fn write_observed_by_later_connection() {
    let store = MemoryStore::new();
    let content = pseudo_random_content(PAGE + 1, 37);

    let mut writer = open_rw(&store, "shared");
    writer.write(&content, 1).unwrap();
    writer.close();

    let mut reader =
        VirtualFile::open(Box::new(store.clone()), "shared", OpenMode::ReadOnly).unwrap();
    assert_eq!(reader.read(1, content.len()).unwrap(), content);
}

#[test]
fn repeated_writes_accumulate_tell() {
    let store = MemoryStore::new();
    let mut file = open_rw(&store, "log");

    file.write(&[0u8; 100], 1).unwrap();
    file.write(&[1u8; 40], 1).unwrap();

    // The cursor was never reset, so it sits at prior + new length even
    // though the file is now only 40 bytes long.
    assert_eq!(file.tell(), 140);

    // Reading from there is an immediate EOF; a seek recovers.
    assert!(matches!(file.read(1, 1), Err(FileError::EndOfFile)));
    file.seek(0, Whence::Start).unwrap();
    assert_eq!(file.read(1, 40).unwrap(), vec![1u8; 40]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn roundtrip_across_page_boundary_sizes(
        len in prop_oneof![
            1usize..512,
            (PAGE - 3)..(PAGE + 4),
            (2 * PAGE - 3)..(2 * PAGE + 4),
        ],
        seed in any::<u64>(),
    ) {
        let store = MemoryStore::new();
        let content = pseudo_random_content(len, seed);

        let mut file = open_rw(&store, "prop");
        file.write(&content, 1).unwrap();
        file.seek(0, Whence::Start).unwrap();

        let bytes = file.read(1, len).unwrap();
        prop_assert_eq!(bytes, content);
        prop_assert_eq!(file.tell(), len as u64);

        prop_assert!(matches!(file.read(1, 1), Err(FileError::EndOfFile)));
    }
}
