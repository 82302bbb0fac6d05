//! # Sequential Storage
//!
//! An append-only storage: records pile up behind a root page and are read
//! back in arrival order. The core only carries its creation path — a root
//! page typed [`PageType::SequentialRoot`] and a create-log record with no
//! type-specific fields.

use crate::error::StorageError;
use crate::log::{CreateLogHeader, LogBuffer, CREATE_LOG_HEADER_SIZE, LOG_TYPE_CREATE_SEQUENTIAL};
use crate::memory::PageAllocation;
use crate::storage::metadata::{SequentialMetadata, StorageMetadata};
use crate::storage::registry::{CreateContext, Storage, StorageFactory};
use crate::storage::{
    Page, PageType, StorageId, StorageName, VolatilePageInitializer, VolatilePagePointer,
};
use crate::thread::ThreadId;
use eyre::{Result, WrapErr};
use std::sync::Arc;
use zerocopy::IntoBytes;

/// A live sequential storage handle.
#[derive(Debug)]
pub struct SequentialStorage {
    metadata: SequentialMetadata,
    root_pointer: VolatilePagePointer,
    root_page: Box<Page>,
}

impl Storage for SequentialStorage {
    fn id(&self) -> StorageId {
        self.metadata.id
    }

    fn name(&self) -> &StorageName {
        &self.metadata.name
    }

    fn storage_type(&self) -> PageType {
        PageType::SequentialRoot
    }

    fn metadata(&self) -> StorageMetadata {
        StorageMetadata::Sequential(self.metadata.clone())
    }

    fn root_page(&self) -> &Page {
        &self.root_page
    }

    fn root_pointer(&self) -> VolatilePagePointer {
        self.root_pointer
    }
}

fn add_create_log(log: &mut dyn LogBuffer, thread: ThreadId, metadata: &SequentialMetadata) {
    let length = CREATE_LOG_HEADER_SIZE + metadata.name.len();
    let record = log.reserve_new_log(length);

    let header = CreateLogHeader::new(
        length as u16,
        LOG_TYPE_CREATE_SEQUENTIAL,
        thread,
        metadata.name.len() as u16,
        metadata.id,
    );
    record[..CREATE_LOG_HEADER_SIZE].copy_from_slice(header.as_bytes());
    record[CREATE_LOG_HEADER_SIZE..].copy_from_slice(metadata.name.as_str().as_bytes());
}

/// Builds sequential storages from [`SequentialMetadata`].
#[derive(Default)]
pub struct SequentialStorageFactory;

impl StorageFactory for SequentialStorageFactory {
    fn storage_type(&self) -> PageType {
        PageType::SequentialRoot
    }

    fn create(
        &self,
        metadata: &StorageMetadata,
        ctx: &mut CreateContext<'_>,
    ) -> Result<Arc<dyn Storage>> {
        let StorageMetadata::Sequential(metadata) = metadata else {
            tracing::warn!(
                actual = ?metadata.storage_type(),
                "sequential factory received metadata of another storage type"
            );
            return Err(StorageError::WrongMetadataType {
                expected: PageType::SequentialRoot,
                actual: metadata.storage_type(),
            }
            .into());
        };

        let node = ctx.thread.group();
        let PageAllocation { pointer, mut page } = ctx.pool.allocate(node).wrap_err_with(|| {
            format!("allocating root page for sequential storage {}", metadata.id)
        })?;

        let initializer = VolatilePageInitializer::new(
            metadata.id,
            PageType::SequentialRoot,
            true,
            |_page: &mut Page| {},
        );
        initializer.initialize(&mut page, pointer);
        page.header_mut().update_modify_stats(node, ctx.epoch);

        add_create_log(ctx.log, ctx.thread, metadata);
        tracing::info!(
            storage_id = metadata.id,
            name = %metadata.name,
            "created sequential storage"
        );

        Ok(Arc::new(SequentialStorage {
            metadata: metadata.clone(),
            root_pointer: pointer,
            root_page: page,
        }))
    }
}
