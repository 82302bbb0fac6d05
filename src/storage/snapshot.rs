//! # Snapshot Page Images
//!
//! Volatile pages live and die in memory; the snapshot subsystem turns them
//! into immutable 4KB on-disk images. This module owns the image format:
//! the little-endian mirror of the common page header plus the integrity
//! checksum.
//!
//! ## Image Layout
//!
//! ```text
//! +---------------------------+ Offset 0
//! | SnapshotPageHeader (32B)  |  little-endian, zerocopy-parseable
//! +---------------------------+ Offset 32
//! | Payload (4064B)           |  verbatim copy of the volatile payload
//! +---------------------------+ Offset 4096
//! ```
//!
//! ## Checksum
//!
//! `checksum` is CRC32C over bytes 32..4096 — the payload only, so the
//! header can be patched (e.g. re-parenting a root pointer) without
//! re-hashing 4KB. It is computed once when the page is sealed and verified
//! every time the image is brought back. A mismatch is fatal for the owning
//! storage: the engine refuses to bring it online.
//!
//! ## Sealing
//!
//! Sealing never mutates the source page. The image gets a fresh header:
//! snapshot flag set, the assigned snapshot page id, a zero version word
//! (snapshot pages are immutable, so lock state would be meaningless), and
//! zeroed statistics hints.

use crate::config::{PAGE_HEADER_SIZE, PAGE_SIZE};
use crate::error::StorageError;
use crate::storage::{Checksum, Page, PageType, SnapshotPagePointer, StorageId};
use crc::{Crc, CRC_32_ISCSI};
use eyre::{ensure, Result};
use zerocopy::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// Little-endian on-disk form of the common page header.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct SnapshotPageHeader {
    page_id: U64,
    storage_id: U32,
    checksum: U32,
    page_type: u8,
    snapshot: u8,
    root: u8,
    stat_latest_modifier: u8,
    stat_latest_modify_epoch: U32,
    page_version: U64,
}

const _: () = assert!(std::mem::size_of::<SnapshotPageHeader>() == PAGE_HEADER_SIZE);

impl SnapshotPageHeader {
    le_accessors! {
        page_id: u64 => U64,
        storage_id: u32 => U32,
        checksum: u32 => U32,
        stat_latest_modify_epoch: u32 => U32,
        page_version: u64 => U64,
    }

    #[inline]
    pub fn page_type(&self) -> PageType {
        PageType::from_byte(self.page_type)
    }

    #[inline]
    pub fn is_snapshot(&self) -> bool {
        self.snapshot != 0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.root != 0
    }

    /// Parses the header prefix of a page image.
    pub fn from_bytes(image: &[u8]) -> Result<&Self> {
        ensure!(
            image.len() >= PAGE_HEADER_SIZE,
            "buffer too small for SnapshotPageHeader: {} < {}",
            image.len(),
            PAGE_HEADER_SIZE
        );
        Self::ref_from_bytes(&image[..PAGE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse SnapshotPageHeader: {:?}", e))
    }
}

/// CRC32C over the payload region of a 4KB page image.
pub fn compute_page_checksum(image: &[u8]) -> Checksum {
    debug_assert_eq!(image.len(), PAGE_SIZE);
    CRC32C.checksum(&image[PAGE_HEADER_SIZE..])
}

/// Seals a volatile page into an immutable snapshot image.
///
/// `page_id` is the snapshot pointer assigned by the snapshot writer; it
/// must be non-null. The source page is not modified.
pub fn seal_snapshot_page(
    page: &Page,
    page_id: SnapshotPagePointer,
    out: &mut [u8],
) -> Result<()> {
    ensure!(
        out.len() == PAGE_SIZE,
        "snapshot image buffer must be {} bytes, got {}",
        PAGE_SIZE,
        out.len()
    );
    ensure!(page_id != 0, "snapshot page id must be non-null");
    let source = page.header();
    ensure!(
        source.page_type() != PageType::Unknown,
        "refusing to seal a page with an Unknown type tag"
    );

    out[PAGE_HEADER_SIZE..].copy_from_slice(page.payload());
    let checksum = compute_page_checksum(out);

    let header = SnapshotPageHeader {
        page_id: U64::new(page_id),
        storage_id: U32::new(source.storage_id()),
        checksum: U32::new(checksum),
        page_type: source.page_type() as u8,
        snapshot: 1,
        root: source.is_root() as u8,
        stat_latest_modifier: 0,
        stat_latest_modify_epoch: U32::new(0),
        page_version: U64::new(0),
    };
    out[..PAGE_HEADER_SIZE].copy_from_slice(header.as_bytes());
    Ok(())
}

/// Verifies a snapshot page image before it is trusted.
///
/// Checks, in order: the snapshot flag, the page type tag against
/// `expected_type`, the owning storage id, and the payload checksum.
/// Type and checksum failures carry the [`StorageError`] kinds that make
/// the storage refuse to come online.
pub fn verify_snapshot_page<'a>(
    image: &'a [u8],
    expected_storage_id: StorageId,
    expected_type: PageType,
) -> Result<&'a SnapshotPageHeader> {
    ensure!(
        image.len() == PAGE_SIZE,
        "snapshot image must be {} bytes, got {}",
        PAGE_SIZE,
        image.len()
    );
    let header = SnapshotPageHeader::from_bytes(image)?;
    ensure!(
        header.is_snapshot(),
        "page image is not flagged as a snapshot page"
    );

    if header.page_type() != expected_type {
        return Err(StorageError::PageTypeMismatch {
            expected: expected_type,
            actual: header.page_type(),
        }
        .into());
    }
    ensure!(
        header.storage_id() == expected_storage_id,
        "snapshot page belongs to storage {}, expected {}",
        header.storage_id(),
        expected_storage_id
    );

    let computed = compute_page_checksum(image);
    if computed != header.checksum() {
        tracing::warn!(
            page_id = header.page_id(),
            storage_id = header.storage_id(),
            stored = header.checksum(),
            computed,
            "snapshot page failed integrity check"
        );
        return Err(StorageError::ChecksumMismatch {
            stored: header.checksum(),
            computed,
        }
        .into());
    }
    Ok(header)
}

/// Verifies an image and materializes it as an in-memory page.
pub fn load_snapshot_page(
    image: &[u8],
    expected_storage_id: StorageId,
    expected_type: PageType,
) -> Result<Box<Page>> {
    let header = verify_snapshot_page(image, expected_storage_id, expected_type)?;
    let (page_id, checksum, root) = (header.page_id(), header.checksum(), header.is_root());

    let mut page = Page::new_boxed();
    page.header_mut()
        .init_snapshot(page_id, expected_storage_id, expected_type, root);
    page.header_mut().set_checksum(checksum);
    page.payload_mut().copy_from_slice(&image[PAGE_HEADER_SIZE..]);
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::VolatilePagePointer;

    fn sealed_array_page() -> (Box<Page>, Vec<u8>) {
        let mut page = Page::new_boxed();
        page.header_mut()
            .init_volatile(VolatilePagePointer::new(1, 10), 42, PageType::Array, true);
        page.payload_mut()[..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let mut image = vec![0u8; PAGE_SIZE];
        seal_snapshot_page(&page, 0x00AA_0000_0001, &mut image).unwrap();
        (page, image)
    }

    #[test]
    fn seal_then_verify_roundtrips() {
        let (_page, image) = sealed_array_page();
        let header = verify_snapshot_page(&image, 42, PageType::Array).unwrap();

        assert_eq!(header.page_id(), 0x00AA_0000_0001);
        assert_eq!(header.storage_id(), 42);
        assert!(header.is_snapshot());
        assert!(header.is_root());
        assert_eq!(header.page_type(), PageType::Array);
        assert_eq!(header.page_version(), 0);
    }

    #[test]
    fn sealed_header_is_little_endian_on_disk() {
        let (_page, image) = sealed_array_page();
        // page_id occupies the first 8 bytes, little-endian.
        assert_eq!(
            u64::from_le_bytes(image[..8].try_into().unwrap()),
            0x00AA_0000_0001
        );
        // storage_id is next.
        assert_eq!(u32::from_le_bytes(image[8..12].try_into().unwrap()), 42);
        // type tag, snapshot flag, root flag.
        assert_eq!(image[16], PageType::Array as u8);
        assert_eq!(image[17], 1);
        assert_eq!(image[18], 1);
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let (_page, mut image) = sealed_array_page();
        image[PAGE_HEADER_SIZE + 100] ^= 0x01;

        let err = verify_snapshot_page(&image, 42, PageType::Array).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn wrong_expected_type_is_a_type_mismatch() {
        let (_page, image) = sealed_array_page();
        let err = verify_snapshot_page(&image, 42, PageType::HashRoot).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StorageError>(),
            Some(&StorageError::PageTypeMismatch {
                expected: PageType::HashRoot,
                actual: PageType::Array,
            })
        );
    }

    #[test]
    fn wrong_storage_id_is_rejected() {
        let (_page, image) = sealed_array_page();
        assert!(verify_snapshot_page(&image, 43, PageType::Array).is_err());
    }

    #[test]
    fn volatile_image_is_rejected() {
        let (_page, mut image) = sealed_array_page();
        image[17] = 0; // clear the snapshot flag
        assert!(verify_snapshot_page(&image, 42, PageType::Array).is_err());
    }

    #[test]
    fn load_reconstructs_the_page() {
        let (page, image) = sealed_array_page();
        let loaded = load_snapshot_page(&image, 42, PageType::Array).unwrap();

        let header = loaded.header();
        assert!(header.is_snapshot());
        assert_eq!(header.snapshot_page_id(), 0x00AA_0000_0001);
        assert_eq!(header.storage_id(), 42);
        assert_eq!(header.page_type(), PageType::Array);
        assert!(header.is_root());
        assert_eq!(header.page_version().value().data(), 0);
        assert_eq!(loaded.payload(), page.payload());
    }

    #[test]
    fn sealing_an_unknown_page_is_refused() {
        let page = Page::new_boxed();
        let mut image = vec![0u8; PAGE_SIZE];
        assert!(seal_snapshot_page(&page, 1, &mut image).is_err());
    }

    #[test]
    fn sealing_with_null_id_is_refused() {
        let (page, _) = sealed_array_page();
        let mut image = vec![0u8; PAGE_SIZE];
        assert!(seal_snapshot_page(&page, 0, &mut image).is_err());
    }
}
