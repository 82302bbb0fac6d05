//! # Create-Log Records
//!
//! Storage creation must be durable: when a factory builds a storage it
//! appends a create-log record to the creating thread's log buffer, and
//! replay rebuilds the registry from those records. The log buffer itself
//! (a per-thread ring with group-commit flushing) lives outside this core;
//! [`LogBuffer`] is the reservation capability the factories consume.
//!
//! ## Record Layout
//!
//! Every create-log record starts with the same little-endian header:
//!
//! ```text
//! Offset  Size  Field        Description
//! ------  ----  -----------  ------------------------------------
//! 0       2     length       Total record length in bytes
//! 2       2     log_type     LOG_TYPE_CREATE_* code
//! 4       2     thread_id    Creating thread, wire format (LE)
//! 6       2     name_length  Bytes of name trailing the record
//! 8       4     storage_id   Id of the created storage
//! ```
//!
//! Type-specific fields follow the header, then the storage name bytes.
//! An array create record appends `array_size` (u64) and `payload_size`
//! (u16) before the name.

use crate::thread::ThreadId;
use eyre::{ensure, Result};
use zerocopy::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Record code of an array storage creation.
pub const LOG_TYPE_CREATE_ARRAY: u16 = 1;
/// Record code of a sequential storage creation.
pub const LOG_TYPE_CREATE_SEQUENTIAL: u16 = 2;

/// The thread-local log buffer capability consumed by factories.
///
/// `reserve_new_log` hands back a zeroed, exclusively owned slice of
/// exactly `length` bytes; the caller populates it in place.
pub trait LogBuffer {
    fn reserve_new_log(&mut self, length: usize) -> &mut [u8];
}

/// Common prefix of every create-log record.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct CreateLogHeader {
    length: U16,
    log_type: U16,
    thread_id: U16,
    name_length: U16,
    storage_id: U32,
}

pub const CREATE_LOG_HEADER_SIZE: usize = std::mem::size_of::<CreateLogHeader>();

const _: () = assert!(CREATE_LOG_HEADER_SIZE == 12);

impl CreateLogHeader {
    le_accessors! {
        length: u16 => U16,
        log_type: u16 => U16,
        name_length: u16 => U16,
        storage_id: u32 => U32,
    }

    pub fn new(
        length: u16,
        log_type: u16,
        thread_id: ThreadId,
        name_length: u16,
        storage_id: u32,
    ) -> Self {
        Self {
            length: U16::new(length),
            log_type: U16::new(log_type),
            thread_id: U16::new(thread_id.raw()),
            name_length: U16::new(name_length),
            storage_id: U32::new(storage_id),
        }
    }

    /// The creating thread, decoded from its wire form.
    pub fn thread_id(&self) -> ThreadId {
        ThreadId::from_raw(self.thread_id.get())
    }

    /// Parses the header prefix of a record.
    pub fn from_bytes(record: &[u8]) -> Result<&Self> {
        ensure!(
            record.len() >= CREATE_LOG_HEADER_SIZE,
            "buffer too small for CreateLogHeader: {} < {}",
            record.len(),
            CREATE_LOG_HEADER_SIZE
        );
        Self::ref_from_bytes(&record[..CREATE_LOG_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse CreateLogHeader: {:?}", e))
    }
}

/// Type-specific fields of an array create record.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct ArrayCreateLogBody {
    array_size: U64,
    payload_size: U16,
}

pub const ARRAY_CREATE_LOG_BODY_SIZE: usize = std::mem::size_of::<ArrayCreateLogBody>();

impl ArrayCreateLogBody {
    le_accessors! {
        array_size: u64 => U64,
        payload_size: u16 => U16,
    }

    pub fn new(array_size: u64, payload_size: u16) -> Self {
        Self {
            array_size: U64::new(array_size),
            payload_size: U16::new(payload_size),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= ARRAY_CREATE_LOG_BODY_SIZE,
            "buffer too small for ArrayCreateLogBody: {} < {}",
            bytes.len(),
            ARRAY_CREATE_LOG_BODY_SIZE
        );
        Self::ref_from_bytes(&bytes[..ARRAY_CREATE_LOG_BODY_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse ArrayCreateLogBody: {:?}", e))
    }
}

/// Growable in-memory log buffer for tests and tools. Records are appended
/// back to back; [`records`](Self::records) walks them by their length
/// prefix.
#[derive(Default)]
pub struct VecLogBuffer {
    bytes: Vec<u8>,
}

impl VecLogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterates the appended records in order.
    pub fn records(&self) -> impl Iterator<Item = &[u8]> {
        let mut rest = self.bytes.as_slice();
        std::iter::from_fn(move || {
            let header = CreateLogHeader::from_bytes(rest).ok()?;
            let length = header.length() as usize;
            if length < CREATE_LOG_HEADER_SIZE || length > rest.len() {
                return None;
            }
            let (record, tail) = rest.split_at(length);
            rest = tail;
            Some(record)
        })
    }
}

impl LogBuffer for VecLogBuffer {
    fn reserve_new_log(&mut self, length: usize) -> &mut [u8] {
        let start = self.bytes.len();
        self.bytes.resize(start + length, 0);
        &mut self.bytes[start..]
    }
}
