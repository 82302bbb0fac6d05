//! # Error Taxonomy
//!
//! Fallible operations throughout the crate return [`eyre::Result`]. The
//! failure site constructs one of the [`StorageError`] kinds below and
//! converts it into an `eyre::Report`; each caller on the way up attaches
//! its own context string with `wrap_err`, so a surfaced error carries both
//! a stable machine-checkable kind and an append-only stack of human
//! context.
//!
//! Callers that need to branch on the kind use
//! `report.downcast_ref::<StorageError>()`:
//!
//! ```ignore
//! match registry.get(id) {
//!     Ok(storage) => ...,
//!     Err(report) if matches!(
//!         report.downcast_ref::<StorageError>(),
//!         Some(StorageError::NotFound(_))
//!     ) => ...,
//!     Err(report) => return Err(report),
//! }
//! ```
//!
//! ## Recoverability
//!
//! - Registry and metadata kinds (`WrongMetadataType`, `InvalidOption`,
//!   `DuplicateId`, `DuplicateName`, `NotFound`) are recoverable and
//!   surfaced to whoever asked for the storage.
//! - `ChecksumMismatch` and `PageTypeMismatch` are fatal for the affected
//!   storage: the engine refuses to bring it online.
//! - `Timeout` is always recoverable; callers retry or abort.

use crate::storage::{PageType, StorageId};
use thiserror::Error;

/// Stable error kinds of the storage core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// A factory received metadata whose type tag does not match it.
    #[error("metadata type {actual:?} does not match factory storage type {expected:?}")]
    WrongMetadataType { expected: PageType, actual: PageType },

    /// Metadata carried a value no storage can be built from.
    #[error("invalid storage option: {0}")]
    InvalidOption(String),

    /// A storage with this id is already registered.
    #[error("storage id {0} already exists")]
    DuplicateId(StorageId),

    /// A storage with this name is already registered.
    #[error("storage name '{0}' already exists")]
    DuplicateName(String),

    /// A lookup that required a storage found none.
    #[error("storage id {0} not found")]
    NotFound(StorageId),

    /// A snapshot page image failed its integrity check.
    #[error("page checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// A page header's type tag disagrees with what the caller expected.
    #[error("page type {actual:?} does not match expected {expected:?}")]
    PageTypeMismatch { expected: PageType, actual: PageType },

    /// A conditional or deadline-bounded acquisition ran out of budget.
    #[error("operation timed out")]
    Timeout,
}
