//! # Array Storage
//!
//! A dense, fixed-size array of fixed-size payloads: the simplest storage
//! kind, and the one that exercises every seam of the core — metadata
//! validation, root page initialization, and create-logging.
//!
//! ## Root Page
//!
//! The root page is typed [`PageType::Array`] and stamped with the array's
//! shape so a reader holding only the page can size its traversal:
//!
//! ```text
//! Payload offset  Size  Field
//! --------------  ----  -------------
//! 0               8     array_size    (u64, little-endian)
//! 8               2     payload_size  (u16, little-endian)
//! ```
//!
//! ## Validation
//!
//! An array has no notion of insert or delete, so a zero payload size is
//! meaningless, and a zero element count describes no storage at all; the
//! factory rejects both with `InvalidOption`.

use crate::error::StorageError;
use crate::log::{
    ArrayCreateLogBody, CreateLogHeader, LogBuffer, ARRAY_CREATE_LOG_BODY_SIZE,
    CREATE_LOG_HEADER_SIZE, LOG_TYPE_CREATE_ARRAY,
};
use crate::memory::PageAllocation;
use crate::storage::metadata::{ArrayMetadata, StorageMetadata};
use crate::storage::registry::{CreateContext, Storage, StorageFactory};
use crate::storage::{
    Page, PageType, StorageId, StorageName, VolatilePageInitializer, VolatilePagePointer,
};
use crate::thread::ThreadId;
use eyre::{Result, WrapErr};
use std::sync::Arc;
use zerocopy::IntoBytes;

/// A live array storage handle.
#[derive(Debug)]
pub struct ArrayStorage {
    metadata: ArrayMetadata,
    root_pointer: VolatilePagePointer,
    root_page: Box<Page>,
}

impl ArrayStorage {
    /// Number of elements.
    pub fn array_size(&self) -> u64 {
        self.metadata.array_size
    }

    /// Byte size of each element's payload.
    pub fn payload_size(&self) -> u16 {
        self.metadata.payload_size
    }
}

impl Storage for ArrayStorage {
    fn id(&self) -> StorageId {
        self.metadata.id
    }

    fn name(&self) -> &StorageName {
        &self.metadata.name
    }

    fn storage_type(&self) -> PageType {
        PageType::Array
    }

    fn metadata(&self) -> StorageMetadata {
        StorageMetadata::Array(self.metadata.clone())
    }

    fn root_page(&self) -> &Page {
        &self.root_page
    }

    fn root_pointer(&self) -> VolatilePagePointer {
        self.root_pointer
    }
}

/// Reads the shape stamp back from an array root page.
pub fn read_root_shape(page: &Page) -> (u64, u16) {
    let payload = page.payload();
    let array_size = u64::from_le_bytes(payload[..8].try_into().expect("8-byte prefix"));
    let payload_size = u16::from_le_bytes(payload[8..10].try_into().expect("2-byte field"));
    (array_size, payload_size)
}

fn stamp_root_shape(page: &mut Page, array_size: u64, payload_size: u16) {
    let payload = page.payload_mut();
    payload[..8].copy_from_slice(&array_size.to_le_bytes());
    payload[8..10].copy_from_slice(&payload_size.to_le_bytes());
}

fn add_create_log(log: &mut dyn LogBuffer, thread: ThreadId, metadata: &ArrayMetadata) {
    let length = CREATE_LOG_HEADER_SIZE + ARRAY_CREATE_LOG_BODY_SIZE + metadata.name.len();
    let record = log.reserve_new_log(length);

    let header = CreateLogHeader::new(
        length as u16,
        LOG_TYPE_CREATE_ARRAY,
        thread,
        metadata.name.len() as u16,
        metadata.id,
    );
    record[..CREATE_LOG_HEADER_SIZE].copy_from_slice(header.as_bytes());

    let body = ArrayCreateLogBody::new(metadata.array_size, metadata.payload_size);
    let body_end = CREATE_LOG_HEADER_SIZE + ARRAY_CREATE_LOG_BODY_SIZE;
    record[CREATE_LOG_HEADER_SIZE..body_end].copy_from_slice(body.as_bytes());
    record[body_end..].copy_from_slice(metadata.name.as_str().as_bytes());
}

/// Builds array storages from [`ArrayMetadata`].
#[derive(Default)]
pub struct ArrayStorageFactory;

impl StorageFactory for ArrayStorageFactory {
    fn storage_type(&self) -> PageType {
        PageType::Array
    }

    fn create(
        &self,
        metadata: &StorageMetadata,
        ctx: &mut CreateContext<'_>,
    ) -> Result<Arc<dyn Storage>> {
        let StorageMetadata::Array(metadata) = metadata else {
            tracing::warn!(
                actual = ?metadata.storage_type(),
                "array factory received metadata of another storage type"
            );
            return Err(StorageError::WrongMetadataType {
                expected: PageType::Array,
                actual: metadata.storage_type(),
            }
            .into());
        };
        if metadata.payload_size == 0 {
            tracing::info!(storage_id = metadata.id, "empty payload is not allowed for array storage");
            return Err(
                StorageError::InvalidOption("array payload_size must be positive".into()).into(),
            );
        }
        if metadata.array_size == 0 {
            tracing::info!(storage_id = metadata.id, "empty array is not allowed");
            return Err(
                StorageError::InvalidOption("array array_size must be positive".into()).into(),
            );
        }

        let node = ctx.thread.group();
        let PageAllocation { pointer, mut page } = ctx
            .pool
            .allocate(node)
            .wrap_err_with(|| format!("allocating root page for array storage {}", metadata.id))?;

        let (array_size, payload_size) = (metadata.array_size, metadata.payload_size);
        let initializer =
            VolatilePageInitializer::new(metadata.id, PageType::Array, true, move |page: &mut Page| {
                stamp_root_shape(page, array_size, payload_size);
            });
        initializer.initialize(&mut page, pointer);
        page.header_mut().update_modify_stats(node, ctx.epoch);

        add_create_log(ctx.log, ctx.thread, metadata);
        tracing::info!(
            storage_id = metadata.id,
            name = %metadata.name,
            array_size,
            payload_size,
            "created array storage"
        );

        Ok(Arc::new(ArrayStorage {
            metadata: metadata.clone(),
            root_pointer: pointer,
            root_page: page,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epoch::Epoch;
    use crate::log::VecLogBuffer;
    use crate::memory::HeapPagePool;
    use crate::storage::metadata::SequentialMetadata;

    fn array_metadata(id: StorageId, payload_size: u16, array_size: u64) -> StorageMetadata {
        StorageMetadata::Array(ArrayMetadata::new(
            id,
            StorageName::try_new("prices").unwrap(),
            array_size,
            payload_size,
        ))
    }

    fn create(metadata: &StorageMetadata) -> Result<Arc<dyn Storage>> {
        let pool = HeapPagePool::new();
        let mut log = VecLogBuffer::new();
        let mut ctx = CreateContext {
            pool: &pool,
            log: &mut log,
            thread: ThreadId::new(1, 4),
            epoch: Epoch::FIRST_TRANSACTIONAL,
        };
        ArrayStorageFactory.create(metadata, &mut ctx)
    }

    #[test]
    fn zero_payload_size_is_rejected() {
        let err = create(&array_metadata(5, 0, 1024)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::InvalidOption(_))
        ));
    }

    #[test]
    fn zero_array_size_is_rejected() {
        let err = create(&array_metadata(5, 16, 0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::InvalidOption(_))
        ));
    }

    #[test]
    fn wrong_metadata_variant_is_rejected() {
        let metadata = StorageMetadata::Sequential(SequentialMetadata::new(
            5,
            StorageName::try_new("not_an_array").unwrap(),
        ));
        let err = create(&metadata).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StorageError>(),
            Some(&StorageError::WrongMetadataType {
                expected: PageType::Array,
                actual: PageType::SequentialRoot,
            })
        );
    }

    #[test]
    fn valid_metadata_creates_an_initialized_root() {
        let storage = create(&array_metadata(5, 16, 1024)).unwrap();
        assert_eq!(storage.id(), 5);
        assert_eq!(storage.storage_type(), PageType::Array);

        let header = storage.root_page().header();
        assert_eq!(header.storage_id(), 5);
        assert_eq!(header.page_type(), PageType::Array);
        assert!(!header.is_snapshot());
        assert!(header.is_root());
        assert_eq!(header.page_version().value().data(), 0);
        // Allocated on the creating thread's NUMA node.
        assert_eq!(storage.root_pointer().numa_node(), 1);
        assert_eq!(header.volatile_page_id(), storage.root_pointer());
    }

    #[test]
    fn root_page_carries_the_array_shape() {
        let storage = create(&array_metadata(9, 32, 4096)).unwrap();
        assert_eq!(read_root_shape(storage.root_page()), (4096, 32));
    }

    #[test]
    fn create_log_records_shape_name_and_thread() {
        let pool = HeapPagePool::new();
        let mut log = VecLogBuffer::new();
        let metadata = array_metadata(7, 16, 1024);
        {
            let mut ctx = CreateContext {
                pool: &pool,
                log: &mut log,
                thread: ThreadId::new(2, 30),
                epoch: Epoch::FIRST_TRANSACTIONAL,
            };
            ArrayStorageFactory.create(&metadata, &mut ctx).unwrap();
        }

        let records: Vec<&[u8]> = log.records().collect();
        assert_eq!(records.len(), 1);
        let record = records[0];

        let header = CreateLogHeader::from_bytes(record).unwrap();
        assert_eq!(header.log_type(), LOG_TYPE_CREATE_ARRAY);
        assert_eq!(header.storage_id(), 7);
        assert_eq!(header.thread_id(), ThreadId::new(2, 30));
        assert_eq!(header.length() as usize, record.len());

        let body = ArrayCreateLogBody::from_bytes(&record[CREATE_LOG_HEADER_SIZE..]).unwrap();
        assert_eq!(body.array_size(), 1024);
        assert_eq!(body.payload_size(), 16);

        let name_start = CREATE_LOG_HEADER_SIZE + ARRAY_CREATE_LOG_BODY_SIZE;
        assert_eq!(&record[name_start..], b"prices");
    }
}
