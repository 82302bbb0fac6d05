//! # Pages, the Common Header, and the Version Word
//!
//! Every page is a fixed 4KB byte region beginning with the same 32-byte
//! header, no matter which storage kind owns it. There is no runtime type
//! machinery: consumers read the one-byte type tag at a fixed offset and
//! reinterpret the payload accordingly.
//!
//! ## Page Header Layout (32 bytes)
//!
//! ```text
//! Offset  Size  Field                     Description
//! ------  ----  ------------------------  ---------------------------------
//! 0       8     page_id                   VolatilePagePointer word or
//!                                         SnapshotPagePointer, per `snapshot`
//! 8       4     storage_id                Owning storage
//! 12      4     checksum                  Meaningful on snapshot pages only
//! 16      1     page_type                 PageType tag; 0 = Unknown
//! 17      1     snapshot                  Snapshot (true) or volatile page
//! 18      1     root                      The storage's single root page
//! 19      1     stat_latest_modifier      NUMA node of last writer (hint)
//! 20      4     stat_latest_modify_epoch  When that write happened (hint)
//! 24      8     page_version              Concurrency control word
//! ```
//!
//! The two `stat_` fields are non-transactional statistics used for
//! partitioning and hot-page tracking; nothing correctness-critical may
//! read them.
//!
//! ## The Version Word
//!
//! [`PageVersion`] packs a spinlock, structural-modification flags, two
//! monotone counters, and mutable physical state into one atomic u64:
//!
//! ```text
//! Bit     Field                    Mutability
//! ------  -----------------------  --------------------------------
//! 63      locked                   CAS-acquired, cleared at unlock
//! 62      inserting                set under lock, cleared at unlock
//! 61      splitting                set under lock, cleared at unlock
//! 60      deleted                  reserved, never set today
//! 59      has_foster_child         under lock
//! 58      is_border                write-once at init
//! 57      is_high_fence_supremum   write-once at init
//! 56      (unused)
//! 51-56   insertion counter        monotone, 6 bits
//! 33-50   split counter            monotone, 18 bits
//! 32      (unused)
//! 16-31   physical key count       under lock; includes tombstones
//! 8-15    layer                    write-once at init
//! 0-7     (unused)
//! ```
//!
//! The whole word being one atomic is what makes optimistic reads sound:
//! a reader snapshots it, reads page bytes, re-loads it, and retries when
//! either counter moved or a structural modification is in flight. Fields
//! must never be split across separate atomics.
//!
//! ## Protocols
//!
//! Readers:
//!
//! ```ignore
//! loop {
//!     let observed = version.stable_version();   // spins out of inserting/splitting
//!     // ... read page contents ...
//!     if !version.has_changed(observed) {
//!         break;                                 // linearizable observation
//!     }
//! }
//! ```
//!
//! Writers acquire the lock bit and mutate through the returned guard; the
//! guard's drop performs the unlock, promoting whichever of
//! inserting/splitting was set into its counter with release ordering:
//!
//! ```ignore
//! let mut guard = version.lock();
//! guard.set_inserting_and_increment_key_count();
//! // ... mutate page contents ...
//! // guard drops: counters bump, lock and flags clear, release-published
//! ```
//!
//! Writes made inside the critical section happen-before any
//! `stable_version` observation that sees the post-unlock counter values.
//!
//! ## Page Initialization
//!
//! Freshly allocated volatile pages go through a
//! [`VolatilePageInitializer`]: zero-fill, header init, then a type-specific
//! hook. Code paths that follow a pointer but must never create a page use
//! [`NULL_PAGE_INITIALIZER`].

use crate::config::{PAGE_HEADER_SIZE, PAGE_PAYLOAD_SIZE, PAGE_SIZE};
use crate::epoch::Epoch;
use crate::error::StorageError;
use crate::storage::{Checksum, SnapshotPagePointer, StorageId, VolatilePagePointer};
use crate::thread::{ThreadGroupId, TimeoutMicros};
use eyre::Result;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// One-byte page type tag stored in the common header.
///
/// These values appear in snapshot pages, so they are numerically pinned
/// forever; never renumber them.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    Unknown = 0,
    Array = 1,
    MasstreeIntermediate = 2,
    MasstreeBorder = 3,
    Sequential = 4,
    SequentialRoot = 5,
    HashRoot = 6,
    HashBin = 7,
    HashData = 8,
}

impl PageType {
    /// Decodes a stored tag. Anything unassigned decodes to `Unknown`,
    /// which outside of initialization contexts means a corrupt page.
    pub fn from_byte(b: u8) -> Self {
        match b {
            1 => PageType::Array,
            2 => PageType::MasstreeIntermediate,
            3 => PageType::MasstreeBorder,
            4 => PageType::Sequential,
            5 => PageType::SequentialRoot,
            6 => PageType::HashRoot,
            7 => PageType::HashBin,
            8 => PageType::HashData,
            _ => PageType::Unknown,
        }
    }
}

const LOCKED_BIT: u64 = 1 << 63;
const INSERTING_BIT: u64 = 1 << 62;
const SPLITTING_BIT: u64 = 1 << 61;
// Reserved for a future delete protocol; keeps the bit position stable.
#[allow(dead_code)]
const DELETED_BIT: u64 = 1 << 60;
const HAS_FOSTER_CHILD_BIT: u64 = 1 << 59;
const IS_BORDER_BIT: u64 = 1 << 58;
const IS_SUPREMUM_BIT: u64 = 1 << 57;

const INSERTION_COUNTER_MASK: u64 = 0x01F8_0000_0000_0000;
const INSERTION_COUNTER_SHIFT: u32 = 51;
const SPLIT_COUNTER_MASK: u64 = 0x0007_FFFE_0000_0000;
const SPLIT_COUNTER_SHIFT: u32 = 33;
const KEY_COUNT_MASK: u64 = 0x0000_0000_FFFF_0000;
const KEY_COUNT_SHIFT: u32 = 16;
const LAYER_MASK: u64 = 0x0000_0000_0000_FF00;
const LAYER_SHIFT: u32 = 8;

/// Fields that survive an unlock unchanged. Everything else is either
/// cleared (lock and modification flags) or recomposed (the counters).
const UNLOCK_MASK: u64 = HAS_FOSTER_CHILD_BIT | IS_BORDER_BIT | KEY_COUNT_MASK | LAYER_MASK;

/// How many CAS failures a bounded `try_lock` tolerates before yielding the
/// OS thread instead of burning the core.
const SPINS_BEFORE_YIELD: u32 = 64;

/// The 64-bit per-page version counter and locking mechanism.
///
/// Lives inside every [`PageHeader`]. See the module docs for the bit
/// layout and the reader/writer protocols.
#[derive(Debug)]
#[repr(transparent)]
pub struct PageVersion {
    data: AtomicU64,
}

/// A copied observation of a version word, with field accessors.
///
/// `stable_version` returns one of these; the optimistic read protocol
/// compares the counters of two observations.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PageVersionValue(u64);

impl PageVersionValue {
    #[inline]
    pub const fn data(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_locked(self) -> bool {
        self.0 & LOCKED_BIT != 0
    }

    #[inline]
    pub const fn is_inserting(self) -> bool {
        self.0 & INSERTING_BIT != 0
    }

    #[inline]
    pub const fn is_splitting(self) -> bool {
        self.0 & SPLITTING_BIT != 0
    }

    /// Whether a structural modification is in flight.
    #[inline]
    pub const fn is_dirty(self) -> bool {
        self.0 & (INSERTING_BIT | SPLITTING_BIT) != 0
    }

    #[inline]
    pub const fn has_foster_child(self) -> bool {
        self.0 & HAS_FOSTER_CHILD_BIT != 0
    }

    #[inline]
    pub const fn is_border(self) -> bool {
        self.0 & IS_BORDER_BIT != 0
    }

    #[inline]
    pub const fn is_high_fence_supremum(self) -> bool {
        self.0 & IS_SUPREMUM_BIT != 0
    }

    #[inline]
    pub const fn insertion_counter(self) -> u32 {
        ((self.0 & INSERTION_COUNTER_MASK) >> INSERTION_COUNTER_SHIFT) as u32
    }

    #[inline]
    pub const fn split_counter(self) -> u32 {
        ((self.0 & SPLIT_COUNTER_MASK) >> SPLIT_COUNTER_SHIFT) as u32
    }

    /// Physical record count, tombstones included.
    #[inline]
    pub const fn key_count(self) -> u16 {
        ((self.0 & KEY_COUNT_MASK) >> KEY_COUNT_SHIFT) as u16
    }

    /// Depth in the trie of 8-byte key slices; 0 is the first slice.
    #[inline]
    pub const fn layer(self) -> u8 {
        ((self.0 & LAYER_MASK) >> LAYER_SHIFT) as u8
    }

    /// Whether both monotone counters match between two observations.
    #[inline]
    pub const fn same_counters(self, other: PageVersionValue) -> bool {
        self.insertion_counter() == other.insertion_counter()
            && self.split_counter() == other.split_counter()
    }
}

impl fmt::Debug for PageVersionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageVersionValue")
            .field("locked", &self.is_locked())
            .field("inserting", &self.is_inserting())
            .field("splitting", &self.is_splitting())
            .field("has_foster_child", &self.has_foster_child())
            .field("is_border", &self.is_border())
            .field("is_high_fence_supremum", &self.is_high_fence_supremum())
            .field("insertion_counter", &self.insertion_counter())
            .field("split_counter", &self.split_counter())
            .field("key_count", &self.key_count())
            .field("layer", &self.layer())
            .finish()
    }
}

impl PageVersion {
    /// An all-zero version word: unlocked, no flags, counters at zero.
    #[inline]
    pub const fn new() -> Self {
        Self {
            data: AtomicU64::new(0),
        }
    }

    /// Builds the version word of a page under construction.
    ///
    /// Only legal before the page is published; `is_border`,
    /// `is_high_fence_supremum`, and `layer` are never written again. All
    /// counters and the key count start at zero.
    pub const fn new_initialized(
        locked: bool,
        has_foster_child: bool,
        is_border: bool,
        is_high_fence_supremum: bool,
        layer: u8,
    ) -> Self {
        let mut data = (layer as u64) << LAYER_SHIFT;
        if locked {
            data |= LOCKED_BIT;
        }
        if has_foster_child {
            data |= HAS_FOSTER_CHILD_BIT;
        }
        if is_border {
            data |= IS_BORDER_BIT;
        }
        if is_high_fence_supremum {
            data |= IS_SUPREMUM_BIT;
        }
        Self {
            data: AtomicU64::new(data),
        }
    }

    /// Reconstructs a version from a raw word, e.g. in tests or when
    /// rebuilding a page image.
    #[inline]
    pub const fn from_raw(data: u64) -> Self {
        Self {
            data: AtomicU64::new(data),
        }
    }

    /// The current raw word, with no ordering beyond atomicity.
    #[inline]
    pub fn value(&self) -> PageVersionValue {
        PageVersionValue(self.data.load(Ordering::Relaxed))
    }

    /// Spins until it observes a word with neither `inserting` nor
    /// `splitting` set and returns that observation.
    ///
    /// Every load is an acquire, so page reads that follow are ordered
    /// after the writer's critical section this observation reflects.
    /// Termination relies on writers holding the lock only for bounded
    /// work.
    #[inline]
    pub fn stable_version(&self) -> PageVersionValue {
        loop {
            let word = self.data.load(Ordering::Acquire);
            if word & (INSERTING_BIT | SPLITTING_BIT) == 0 {
                return PageVersionValue(word);
            }
            std::hint::spin_loop();
        }
    }

    /// Re-loads the word and reports whether an optimistic read that
    /// started at `observed` must retry: a structural modification is in
    /// flight, or either counter moved.
    #[inline]
    pub fn has_changed(&self, observed: PageVersionValue) -> bool {
        let current = PageVersionValue(self.data.load(Ordering::Acquire));
        current.is_dirty() || !current.same_counters(observed)
    }

    /// Acquires the page lock, spinning if necessary.
    ///
    /// No fairness guarantee; livelock is avoided because holders do
    /// bounded work. After locking, set the inserting/splitting flags and
    /// mutate through the returned guard; dropping it unlocks.
    pub fn lock(&self) -> PageVersionGuard<'_> {
        loop {
            let word = self.data.load(Ordering::Relaxed);
            if word & LOCKED_BIT != 0 {
                std::hint::spin_loop();
                continue;
            }
            if self
                .data
                .compare_exchange_weak(
                    word,
                    word | LOCKED_BIT,
                    Ordering::Acquire,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return PageVersionGuard {
                    version: self,
                    value: word | LOCKED_BIT,
                    _not_send: PhantomData,
                };
            }
            std::hint::spin_loop();
        }
    }

    /// Like [`lock`](Self::lock), but bounded by `timeout`.
    ///
    /// `timeout == 0` makes a single conditional attempt; a negative
    /// timeout waits forever; a positive timeout is a budget in
    /// microseconds, during which the retry loop mixes spin hints with OS
    /// yields.
    pub fn try_lock(&self, timeout: TimeoutMicros) -> Option<PageVersionGuard<'_>> {
        if timeout < 0 {
            return Some(self.lock());
        }
        if timeout == 0 {
            return self.try_acquire();
        }

        let deadline = Instant::now() + Duration::from_micros(timeout as u64);
        let mut spins = 0u32;
        loop {
            if let Some(guard) = self.try_acquire() {
                return Some(guard);
            }
            if Instant::now() >= deadline {
                return None;
            }
            spins += 1;
            if spins % SPINS_BEFORE_YIELD == 0 {
                std::thread::yield_now();
            } else {
                std::hint::spin_loop();
            }
        }
    }

    /// [`try_lock`](Self::try_lock) that surfaces exhaustion as a
    /// [`StorageError::Timeout`] so callers can propagate it with `?`.
    pub fn lock_with_timeout(&self, timeout: TimeoutMicros) -> Result<PageVersionGuard<'_>> {
        self.try_lock(timeout)
            .ok_or_else(|| eyre::Report::new(StorageError::Timeout))
    }

    fn try_acquire(&self) -> Option<PageVersionGuard<'_>> {
        let word = self.data.load(Ordering::Relaxed);
        if word & LOCKED_BIT != 0 {
            return None;
        }
        self.data
            .compare_exchange(
                word,
                word | LOCKED_BIT,
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .ok()
            .map(|_| PageVersionGuard {
                version: self,
                value: word | LOCKED_BIT,
                _not_send: PhantomData,
            })
    }
}

impl Default for PageVersion {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PageVersion {
    fn clone(&self) -> Self {
        Self {
            data: AtomicU64::new(self.data.load(Ordering::Relaxed)),
        }
    }
}

/// Proof that the page lock is held.
///
/// Only [`PageVersion::lock`]/[`try_lock`](PageVersion::try_lock) construct
/// one. All mutators that require the lock live here, so holding the lock
/// is checked by the compiler rather than at runtime. Dropping the guard
/// performs the unlock: whichever of inserting/splitting was set during the
/// critical section is promoted into its counter (modulo the field width),
/// the lock and modification flags clear, and the new word is published
/// with release ordering.
///
/// The guard is `!Send`: the unlock must happen on the thread that
/// acquired the lock.
#[derive(Debug)]
#[must_use = "dropping the guard immediately unlocks the page"]
pub struct PageVersionGuard<'a> {
    version: &'a PageVersion,
    value: u64,
    _not_send: PhantomData<*mut ()>,
}

impl PageVersionGuard<'_> {
    /// The word as of the last mutation through this guard.
    #[inline]
    pub fn value(&self) -> PageVersionValue {
        PageVersionValue(self.value)
    }

    #[inline]
    fn store(&mut self, new_value: u64) {
        // Exclusivity comes from the lock bit; release keeps the flag
        // visible to stable_version spinners without extra fences.
        self.version.data.store(new_value, Ordering::Release);
        self.value = new_value;
    }

    /// Announces an in-flight insert. The insertion counter bumps at
    /// unlock. Mutually exclusive with `set_splitting` within one critical
    /// section.
    #[inline]
    pub fn set_inserting(&mut self) {
        debug_assert_eq!(self.value & SPLITTING_BIT, 0);
        self.store(self.value | INSERTING_BIT);
    }

    /// Announces an in-flight split. The split counter bumps at unlock.
    /// Mutually exclusive with `set_inserting` within one critical section.
    #[inline]
    pub fn set_splitting(&mut self) {
        debug_assert_eq!(self.value & INSERTING_BIT, 0);
        self.store(self.value | SPLITTING_BIT);
    }

    #[inline]
    pub fn set_has_foster_child(&mut self, has: bool) {
        if has {
            self.store(self.value | HAS_FOSTER_CHILD_BIT);
        } else {
            self.store(self.value & !HAS_FOSTER_CHILD_BIT);
        }
    }

    #[inline]
    pub fn set_key_count(&mut self, key_count: u16) {
        self.store((self.value & !KEY_COUNT_MASK) | ((key_count as u64) << KEY_COUNT_SHIFT));
    }

    #[inline]
    pub fn increment_key_count(&mut self) {
        debug_assert!(self.value().key_count() < u16::MAX);
        self.store(self.value + (1 << KEY_COUNT_SHIFT));
    }

    /// The common insert fast path: one store for both effects.
    #[inline]
    pub fn set_inserting_and_increment_key_count(&mut self) {
        debug_assert_eq!(self.value & SPLITTING_BIT, 0);
        debug_assert!(self.value().key_count() < u16::MAX);
        self.store((self.value | INSERTING_BIT) + (1 << KEY_COUNT_SHIFT));
    }
}

impl Drop for PageVersionGuard<'_> {
    fn drop(&mut self) {
        let current = self.value;
        debug_assert_ne!(current & LOCKED_BIT, 0);
        // The protocol never marks both in one critical section.
        debug_assert!(
            current & INSERTING_BIT == 0 || current & SPLITTING_BIT == 0,
            "inserting and splitting set in the same critical section"
        );

        let base = current & UNLOCK_MASK;
        let mut insertion_counter = current & INSERTION_COUNTER_MASK;
        if current & INSERTING_BIT != 0 {
            insertion_counter =
                insertion_counter.wrapping_add(1 << INSERTION_COUNTER_SHIFT) & INSERTION_COUNTER_MASK;
        }
        let mut split_counter = current & SPLIT_COUNTER_MASK;
        if current & SPLITTING_BIT != 0 {
            split_counter = split_counter.wrapping_add(1 << SPLIT_COUNTER_SHIFT) & SPLIT_COUNTER_MASK;
        }

        // Release-publish so every write of the critical section
        // happens-before any acquire-load that sees the bumped counters.
        fence(Ordering::Release);
        self.version
            .data
            .store(base | insertion_counter | split_counter, Ordering::Release);
    }
}

/// The fixed prefix embedded at offset 0 of every page.
///
/// Any page pointer can be reinterpreted as this header to discover the
/// page's identity, type, and version word; the layout is pinned by the
/// snapshot format (see the module docs).
#[repr(C)]
#[derive(Debug)]
pub struct PageHeader {
    page_id: u64,
    storage_id: StorageId,
    checksum: Checksum,
    page_type: u8,
    snapshot: bool,
    root: bool,
    stat_latest_modifier: ThreadGroupId,
    stat_latest_modify_epoch: Epoch,
    page_version: PageVersion,
}

const _: () = assert!(std::mem::size_of::<PageHeader>() == PAGE_HEADER_SIZE);

impl PageHeader {
    const fn zeroed() -> Self {
        Self {
            page_id: 0,
            storage_id: 0,
            checksum: 0,
            page_type: PageType::Unknown as u8,
            snapshot: false,
            root: false,
            stat_latest_modifier: 0,
            stat_latest_modify_epoch: Epoch::INVALID,
            page_version: PageVersion::new(),
        }
    }

    /// Initializes the header of a freshly allocated volatile page.
    ///
    /// The caller must own the memory exclusively (no concurrent access
    /// until the page is published). Leaves the version word, checksum,
    /// and statistics fields at zero.
    pub fn init_volatile(
        &mut self,
        page_id: VolatilePagePointer,
        storage_id: StorageId,
        page_type: PageType,
        root: bool,
    ) {
        self.page_id = page_id.word();
        self.storage_id = storage_id;
        self.checksum = 0;
        self.page_type = page_type as u8;
        self.snapshot = false;
        self.root = root;
        self.stat_latest_modifier = 0;
        self.stat_latest_modify_epoch = Epoch::INVALID;
        self.page_version = PageVersion::new();
    }

    /// Initializes the header of a snapshot page being materialized.
    ///
    /// Same contract as [`init_volatile`](Self::init_volatile), with the
    /// snapshot flag set and the id interpreted as a snapshot pointer.
    pub fn init_snapshot(
        &mut self,
        page_id: SnapshotPagePointer,
        storage_id: StorageId,
        page_type: PageType,
        root: bool,
    ) {
        self.page_id = page_id;
        self.storage_id = storage_id;
        self.checksum = 0;
        self.page_type = page_type as u8;
        self.snapshot = true;
        self.root = root;
        self.stat_latest_modifier = 0;
        self.stat_latest_modify_epoch = Epoch::INVALID;
        self.page_version = PageVersion::new();
    }

    /// The raw 64-bit page id; interpret per [`is_snapshot`](Self::is_snapshot).
    #[inline]
    pub fn page_id(&self) -> u64 {
        self.page_id
    }

    /// The page id interpreted as a volatile pointer.
    #[inline]
    pub fn volatile_page_id(&self) -> VolatilePagePointer {
        debug_assert!(!self.snapshot);
        VolatilePagePointer::from_word(self.page_id)
    }

    /// The page id interpreted as a snapshot pointer.
    #[inline]
    pub fn snapshot_page_id(&self) -> SnapshotPagePointer {
        debug_assert!(self.snapshot);
        self.page_id
    }

    #[inline]
    pub fn storage_id(&self) -> StorageId {
        self.storage_id
    }

    #[inline]
    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    #[inline]
    pub fn set_checksum(&mut self, checksum: Checksum) {
        self.checksum = checksum;
    }

    /// Decodes the type tag. `Unknown` outside an initialization context
    /// means the page is corrupt.
    #[inline]
    pub fn page_type(&self) -> PageType {
        PageType::from_byte(self.page_type)
    }

    #[inline]
    pub fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// NUMA node of the most recent writer. A statistics hint, maintained
    /// non-transactionally.
    #[inline]
    pub fn latest_modifier(&self) -> ThreadGroupId {
        self.stat_latest_modifier
    }

    /// Epoch of the most recent write. A statistics hint, maintained
    /// non-transactionally.
    #[inline]
    pub fn latest_modify_epoch(&self) -> Epoch {
        self.stat_latest_modify_epoch
    }

    /// Records who touched the page last and when. Requires exclusive
    /// access to the header; concurrent hint maintenance is the owning
    /// storage's problem.
    #[inline]
    pub fn update_modify_stats(&mut self, modifier: ThreadGroupId, epoch: Epoch) {
        self.stat_latest_modifier = modifier;
        self.stat_latest_modify_epoch = epoch;
    }

    #[inline]
    pub fn page_version(&self) -> &PageVersion {
        &self.page_version
    }
}

/// A fixed-size data page: the common header followed by a type-specific
/// payload the core never interprets.
#[repr(C, align(8))]
#[derive(Debug)]
pub struct Page {
    header: PageHeader,
    payload: [u8; PAGE_PAYLOAD_SIZE],
}

const _: () = assert!(std::mem::size_of::<Page>() == PAGE_SIZE);

impl Page {
    /// Heap-allocates a zero-filled page.
    pub fn new_boxed() -> Box<Page> {
        Box::new(Page {
            header: PageHeader::zeroed(),
            payload: [0u8; PAGE_PAYLOAD_SIZE],
        })
    }

    #[inline]
    pub fn header(&self) -> &PageHeader {
        &self.header
    }

    #[inline]
    pub fn header_mut(&mut self) -> &mut PageHeader {
        &mut self.header
    }

    /// The type-specific region. Interpreting it is the owning storage
    /// kind's business.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    #[inline]
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.payload
    }

    /// Resets the whole page to zero bytes.
    pub fn zero_fill(&mut self) {
        self.header = PageHeader::zeroed();
        self.payload.fill(0);
    }
}

/// One-shot initializer for freshly allocated volatile pages.
///
/// A small value carrying the header parameters plus a single type-specific
/// capability: zero-fill the page, initialize the header, then run the
/// hook. Factories build one per root page; page-fault paths that must
/// never create a page pass [`NULL_PAGE_INITIALIZER`].
pub struct VolatilePageInitializer<F = fn(&mut Page)> {
    storage_id: StorageId,
    page_type: PageType,
    root: bool,
    initialize_more: F,
}

impl<F: Fn(&mut Page)> VolatilePageInitializer<F> {
    pub const fn new(storage_id: StorageId, page_type: PageType, root: bool, initialize_more: F) -> Self {
        Self {
            storage_id,
            page_type,
            root,
            initialize_more,
        }
    }

    #[inline]
    pub fn storage_id(&self) -> StorageId {
        self.storage_id
    }

    #[inline]
    pub fn page_type(&self) -> PageType {
        self.page_type
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.root
    }

    /// Zero-fills the page, initializes its header with this initializer's
    /// parameters and the given id, then runs the type-specific hook.
    pub fn initialize(&self, page: &mut Page, page_id: VolatilePagePointer) {
        page.zero_fill();
        page.header_mut()
            .init_volatile(page_id, self.storage_id, self.page_type, self.root);
        (self.initialize_more)(page);
    }
}

fn null_initialize_more(_page: &mut Page) {}

/// The no-op initializer: used when a traversal tolerates a null page and
/// asserts that no page will actually be created.
pub static NULL_PAGE_INITIALIZER: VolatilePageInitializer = VolatilePageInitializer {
    storage_id: 0,
    page_type: PageType::Unknown,
    root: true,
    initialize_more: null_initialize_more,
};
