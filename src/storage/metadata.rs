//! # Storage Metadata
//!
//! Metadata describes a storage's structure, not its data: id, type, name,
//! and where its snapshot root lives, plus whatever shape parameters the
//! storage kind needs (an array storage, for instance, is meaningless
//! without its element count and payload size).
//!
//! ## Representation
//!
//! [`StorageMetadata`] is a tagged variant: the enum discriminant is the
//! storage type, and each variant carries the common fields inline next to
//! its type-specific ones. Factories receive the enum and reject variants
//! that are not theirs.
//!
//! ## Persistence
//!
//! All metadata of all storages is written as one human-readable JSON
//! document per snapshot — readability for debugging outweighs compactness
//! at a few hundred storages. The `type` tag on each entry drives
//! type-dispatched loading. Snapshot metadata is read back at the next
//! snapshotting and at restart; a save → load round-trip must reproduce an
//! equal value.
//!
//! ## Names
//!
//! [`StorageName`] is a fixed-capacity inline string: metadata lives in
//! shared memory regions that are copied around wholesale, so it must not
//! point into any heap.

use crate::config::MAX_STORAGE_NAME_LENGTH;
use crate::error::StorageError;
use crate::storage::{PageType, SnapshotPagePointer, StorageId};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::{Read, Write};

/// Inline fixed-capacity storage name. Always valid UTF-8; compared and
/// hashed by content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageName {
    length: u8,
    bytes: [u8; MAX_STORAGE_NAME_LENGTH],
}

impl StorageName {
    /// Builds a name, rejecting anything over the inline capacity.
    pub fn try_new(name: &str) -> Result<Self> {
        if name.len() > MAX_STORAGE_NAME_LENGTH {
            return Err(StorageError::InvalidOption(format!(
                "storage name exceeds {} bytes: '{}'",
                MAX_STORAGE_NAME_LENGTH, name
            ))
            .into());
        }
        let mut bytes = [0u8; MAX_STORAGE_NAME_LENGTH];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self {
            length: name.len() as u8,
            bytes,
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        // Constructed from &str only; the prefix is always valid UTF-8.
        std::str::from_utf8(&self.bytes[..self.length as usize])
            .expect("StorageName holds valid UTF-8")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl fmt::Display for StorageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for StorageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageName({:?})", self.as_str())
    }
}

impl Serialize for StorageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StorageName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StorageName::try_new(&s).map_err(serde::de::Error::custom)
    }
}

/// Metadata of an array storage: a dense, fixed-size array of fixed-size
/// payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayMetadata {
    pub id: StorageId,
    pub name: StorageName,
    /// 0 until the storage has its first snapshot.
    #[serde(default)]
    pub root_snapshot_page_id: SnapshotPagePointer,
    /// Number of elements. Must be positive.
    pub array_size: u64,
    /// Byte size of each element's payload. Must be positive: an array has
    /// no notion of insert/delete, so an empty payload is meaningless.
    pub payload_size: u16,
}

impl ArrayMetadata {
    pub fn new(id: StorageId, name: StorageName, array_size: u64, payload_size: u16) -> Self {
        Self {
            id,
            name,
            root_snapshot_page_id: 0,
            array_size,
            payload_size,
        }
    }
}

/// Metadata of an append-only sequential storage. Nothing beyond the
/// common fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialMetadata {
    pub id: StorageId,
    pub name: StorageName,
    #[serde(default)]
    pub root_snapshot_page_id: SnapshotPagePointer,
}

impl SequentialMetadata {
    pub fn new(id: StorageId, name: StorageName) -> Self {
        Self {
            id,
            name,
            root_snapshot_page_id: 0,
        }
    }
}

/// Per-storage descriptor, keyed by storage type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageMetadata {
    Array(ArrayMetadata),
    Sequential(SequentialMetadata),
}

impl StorageMetadata {
    /// Unique id. 0 denotes "invalid" and is rejected everywhere.
    pub fn id(&self) -> StorageId {
        match self {
            StorageMetadata::Array(m) => m.id,
            StorageMetadata::Sequential(m) => m.id,
        }
    }

    pub fn name(&self) -> &StorageName {
        match self {
            StorageMetadata::Array(m) => &m.name,
            StorageMetadata::Sequential(m) => &m.name,
        }
    }

    /// The page type of this storage's root page, which doubles as the
    /// factory dispatch tag.
    pub fn storage_type(&self) -> PageType {
        match self {
            StorageMetadata::Array(_) => PageType::Array,
            StorageMetadata::Sequential(_) => PageType::SequentialRoot,
        }
    }

    pub fn root_snapshot_page_id(&self) -> SnapshotPagePointer {
        match self {
            StorageMetadata::Array(m) => m.root_snapshot_page_id,
            StorageMetadata::Sequential(m) => m.root_snapshot_page_id,
        }
    }

    /// Serializes this descriptor as a human-readable JSON document.
    pub fn save<W: Write>(&self, sink: W) -> Result<()> {
        serde_json::to_writer_pretty(sink, self).wrap_err("saving storage metadata")
    }

    /// Loads a descriptor, dispatching on the `type` tag.
    pub fn load<R: Read>(source: R) -> Result<Self> {
        let metadata: StorageMetadata =
            serde_json::from_reader(source).wrap_err("loading storage metadata")?;
        metadata.validate()?;
        Ok(metadata)
    }

    fn validate(&self) -> Result<()> {
        if self.id() == 0 {
            return Err(StorageError::InvalidOption(format!(
                "storage '{}' has the invalid id 0",
                self.name()
            ))
            .into());
        }
        Ok(())
    }
}

/// The whole-registry dump written once per snapshot: the root element
/// enumerates every live storage's metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub storages: Vec<StorageMetadata>,
}

impl MetadataDocument {
    pub fn save<W: Write>(&self, sink: W) -> Result<()> {
        serde_json::to_writer_pretty(sink, self).wrap_err("saving metadata document")
    }

    pub fn load<R: Read>(source: R) -> Result<Self> {
        let document: MetadataDocument =
            serde_json::from_reader(source).wrap_err("loading metadata document")?;
        for metadata in &document.storages {
            metadata.validate()?;
        }
        Ok(document)
    }
}
