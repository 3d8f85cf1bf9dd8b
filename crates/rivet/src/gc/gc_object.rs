// ============ GC Header ============

use crate::StringId;
use crate::rivet_value::str_hash;
use crate::rivet_vm::rivet_limits::LONG_STRING_SLEN;

// Bit positions in the `marked` field
pub const MARKBIT: u8 = 0; // Reached during the current mark phase
pub const FIXEDBIT: u8 = 1; // Pinned by the runtime, never collected
pub const CONSTBIT: u8 = 2; // Lives in static storage, never freed or mutated

// Bit masks
pub const MARKMASK: u8 = 1 << MARKBIT;
pub const FIXEDMASK: u8 = 1 << FIXEDBIT;
pub const CONSTMASK: u8 = 1 << CONSTBIT;

/// GC object header - embedded in every collectable object.
///
/// Bit layout of `marked`:
/// - Bit 0: MARK (reachable this cycle)
/// - Bit 1: FIXED (pinned regardless of reachability)
/// - Bit 2: CONST (build-time object in read-only storage)
///
/// FIXED and CONST are tracked independently; either one makes the object
/// ineligible for sweeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct GcHeader {
    pub marked: u8,
    pub size: usize, // Accounted size of the object in bytes
}

impl GcHeader {
    /// Header of a const object (no mark state, no accounted size).
    pub const CONST: GcHeader = GcHeader {
        marked: CONSTMASK,
        size: 0,
    };

    /// Header for a freshly allocated, unmarked object.
    #[inline(always)]
    pub fn new(size: usize) -> Self {
        GcHeader { marked: 0, size }
    }

    #[inline(always)]
    pub fn is_const(&self) -> bool {
        self.marked & CONSTMASK != 0
    }

    #[inline(always)]
    pub fn is_fixed(&self) -> bool {
        self.marked & FIXEDMASK != 0
    }

    #[inline(always)]
    pub fn is_marked(&self) -> bool {
        self.marked & MARKMASK != 0
    }

    /// Const and fixed objects survive every sweep.
    #[inline(always)]
    pub fn is_collectable(&self) -> bool {
        self.marked & (CONSTMASK | FIXEDMASK) == 0
    }

    /// Idempotent. Const and fixed objects are always retained and take no
    /// part in marking.
    #[inline(always)]
    pub fn mark(&mut self) {
        if self.is_collectable() {
            self.marked |= MARKMASK;
        }
    }

    /// No-op for const objects so callers need not check first.
    #[inline(always)]
    pub fn clear_mark(&mut self) {
        if !self.is_const() {
            self.marked &= !MARKMASK;
        }
    }

    /// Pinning drops any mark already set; fixed objects keep no mark state.
    #[inline(always)]
    pub fn set_fixed(&mut self) {
        if !self.is_const() {
            self.marked = (self.marked | FIXEDMASK) & !MARKMASK;
        }
    }
}

// ============ String objects ============

/// Heap string - shared representation of both variants.
///
/// Short strings keep their length in `slen` and cache their hash; they are
/// created only by the intern table, which also owns the `next` chain link.
/// Long strings store `LONG_STRING_SLEN` in `slen`, take their length from
/// the payload and hash on demand.
pub struct GcString {
    pub header: GcHeader,
    /// Intern table chain link (always `None` for long strings)
    pub(crate) next: Option<StringId>,
    pub(crate) slen: u8,
    pub(crate) extra: u8,
    pub(crate) hash: u32,
    pub(crate) data: Box<[u8]>,
}

impl GcString {
    /// Accounted size of a string object with `len` payload bytes.
    #[inline(always)]
    pub fn alloc_size(len: usize) -> usize {
        std::mem::size_of::<GcString>() + len
    }

    pub(crate) fn new_short(data: Box<[u8]>, hash: u32) -> Self {
        debug_assert!(data.len() < LONG_STRING_SLEN as usize);
        let size = Self::alloc_size(data.len());
        GcString {
            header: GcHeader::new(size),
            next: None,
            slen: data.len() as u8,
            extra: 0,
            hash,
            data,
        }
    }

    pub(crate) fn new_long(data: Box<[u8]>) -> Self {
        let size = Self::alloc_size(data.len());
        GcString {
            header: GcHeader::new(size),
            next: None,
            slen: LONG_STRING_SLEN,
            extra: 0,
            hash: 0,
            data,
        }
    }

    #[inline(always)]
    pub fn is_long(&self) -> bool {
        self.slen == LONG_STRING_SLEN
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        if self.is_long() {
            self.data.len()
        } else {
            self.slen as usize
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Cached for short strings, recomputed on every call for long strings.
    #[inline]
    pub fn hash(&self) -> u32 {
        if self.is_long() {
            str_hash(&self.data)
        } else {
            self.hash
        }
    }

    #[inline(always)]
    pub fn extra(&self) -> u8 {
        self.extra
    }
}
