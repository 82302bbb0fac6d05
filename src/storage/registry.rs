//! # Storage Registry
//!
//! The registry owns the mapping from storage id to live storage handle and
//! the factories that build those handles. It is created at engine init,
//! destroyed at teardown, and shared by every worker thread in between.
//!
//! ## Read Path
//!
//! Lookups vastly outnumber registrations — storages are created a handful
//! of times per process, looked up on every operation. The live set is
//! therefore published as an immutable snapshot behind an `Arc`: a lookup
//! takes the read lock just long enough to clone the `Arc` and then reads
//! the snapshot with no lock held, so a concurrent registration is never
//! blocked behind a reader.
//!
//! ## Write Path
//!
//! A registration validates the metadata (positive id, unique id and name,
//! capacity), dispatches to the factory for that storage type — which
//! builds and initializes the root page and appends the create-log record —
//! and then publishes a fresh snapshot under the write lock, re-checking
//! uniqueness in case a racing registration won.
//!
//! ## Factories
//!
//! Factories are installed once at engine init, before the registry is
//! shared, so the factory table needs no lock at all.

use crate::config::MAX_STORAGES;
use crate::epoch::Epoch;
use crate::error::StorageError;
use crate::log::LogBuffer;
use crate::memory::PagePool;
use crate::storage::metadata::{MetadataDocument, StorageMetadata};
use crate::storage::{Page, PageType, StorageId, StorageName, VolatilePagePointer};
use crate::thread::ThreadId;
use eyre::{ensure, Result, WrapErr};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::io::{Read, Write};
use std::sync::Arc;

/// External collaborators a factory needs while creating a storage: the
/// buffer pool to allocate the root page from, the creating thread's log
/// buffer for the create-log record, and the identity/epoch to stamp.
pub struct CreateContext<'a> {
    pub pool: &'a dyn PagePool,
    pub log: &'a mut dyn LogBuffer,
    pub thread: ThreadId,
    pub epoch: Epoch,
}

/// A live storage handle, type-erased.
pub trait Storage: Send + Sync + std::fmt::Debug {
    fn id(&self) -> StorageId;
    fn name(&self) -> &StorageName;
    fn storage_type(&self) -> PageType;
    /// A deep copy of this storage's descriptor.
    fn metadata(&self) -> StorageMetadata;
    fn root_page(&self) -> &Page;
    fn root_pointer(&self) -> VolatilePagePointer;
}

/// Builds storages of one type from their metadata.
pub trait StorageFactory: Send + Sync {
    /// The type tag this factory handles; registry dispatch key.
    fn storage_type(&self) -> PageType;

    /// Validates the metadata and builds a live storage: root page
    /// allocated and initialized, create-log record appended.
    fn create(
        &self,
        metadata: &StorageMetadata,
        ctx: &mut CreateContext<'_>,
    ) -> Result<Arc<dyn Storage>>;
}

#[derive(Default)]
struct RegistrySnapshot {
    by_id: HashMap<StorageId, Arc<dyn Storage>>,
    by_name: HashMap<StorageName, StorageId>,
}

impl RegistrySnapshot {
    fn check_unique(&self, metadata: &StorageMetadata) -> Result<()> {
        if self.by_id.contains_key(&metadata.id()) {
            return Err(StorageError::DuplicateId(metadata.id()).into());
        }
        if self.by_name.contains_key(metadata.name()) {
            return Err(StorageError::DuplicateName(metadata.name().as_str().to_string()).into());
        }
        Ok(())
    }
}

/// Mapping StorageId → live storage, plus factory dispatch. See the module
/// docs for the concurrency story.
pub struct StorageRegistry {
    factories: HashMap<PageType, Box<dyn StorageFactory>>,
    storages: RwLock<Arc<RegistrySnapshot>>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            storages: RwLock::new(Arc::new(RegistrySnapshot::default())),
        }
    }

    /// Installs a factory. Engine init only, before the registry is shared.
    pub fn register_factory(&mut self, factory: Box<dyn StorageFactory>) -> Result<()> {
        let storage_type = factory.storage_type();
        ensure!(
            !self.factories.contains_key(&storage_type),
            "a factory for {:?} is already registered",
            storage_type
        );
        self.factories.insert(storage_type, factory);
        Ok(())
    }

    /// Creates a storage from its metadata and publishes it.
    pub fn create(
        &self,
        metadata: &StorageMetadata,
        ctx: &mut CreateContext<'_>,
    ) -> Result<Arc<dyn Storage>> {
        if metadata.id() == 0 {
            return Err(StorageError::InvalidOption(
                "storage id 0 is reserved as invalid".into(),
            ))
            .wrap_err_with(|| format!("creating storage '{}'", metadata.name()));
        }
        let factory = self.factories.get(&metadata.storage_type()).ok_or_else(|| {
            eyre::eyre!(
                "no factory registered for storage type {:?}",
                metadata.storage_type()
            )
        })?;

        // Fast-fail on duplicates before paying for the root page; the
        // authoritative check happens again under the write lock.
        self.snapshot().check_unique(metadata)?;

        let storage = factory
            .create(metadata, ctx)
            .wrap_err_with(|| format!("creating storage '{}'", metadata.name()))?;

        let mut published = self.storages.write();
        published.check_unique(metadata)?;
        ensure!(
            published.by_id.len() < MAX_STORAGES,
            "storage limit reached: {}",
            MAX_STORAGES
        );

        let mut next = RegistrySnapshot {
            by_id: published.by_id.clone(),
            by_name: published.by_name.clone(),
        };
        next.by_id.insert(metadata.id(), Arc::clone(&storage));
        next.by_name.insert(*metadata.name(), metadata.id());
        *published = Arc::new(next);

        Ok(storage)
    }

    /// Looks a storage up by id.
    pub fn lookup(&self, id: StorageId) -> Option<Arc<dyn Storage>> {
        self.snapshot().by_id.get(&id).cloned()
    }

    /// Like [`lookup`](Self::lookup), for callers that require the storage
    /// to exist.
    pub fn get(&self, id: StorageId) -> Result<Arc<dyn Storage>> {
        self.lookup(id)
            .ok_or_else(|| eyre::Report::new(StorageError::NotFound(id)))
    }

    /// Every live storage, in id order. This is the enumeration the
    /// snapshot metadata dump walks.
    pub fn each(&self) -> Vec<Arc<dyn Storage>> {
        let snapshot = self.snapshot();
        let mut storages: Vec<Arc<dyn Storage>> = snapshot.by_id.values().cloned().collect();
        storages.sort_by_key(|storage| storage.id());
        storages
    }

    pub fn len(&self) -> usize {
        self.snapshot().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dumps every live storage's metadata as one JSON document.
    pub fn save_metadata<W: Write>(&self, sink: W) -> Result<()> {
        let document = MetadataDocument {
            storages: self.each().iter().map(|storage| storage.metadata()).collect(),
        };
        document.save(sink).wrap_err("dumping registry metadata")
    }

    /// Reads a metadata document back, e.g. at restart before re-creating
    /// the storages it describes.
    pub fn load_metadata<R: Read>(source: R) -> Result<MetadataDocument> {
        MetadataDocument::load(source).wrap_err("reading registry metadata")
    }

    fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.storages.read())
    }
}

impl Default for StorageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
