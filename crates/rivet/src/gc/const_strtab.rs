//! Precompiled const string table.
//!
//! The records and bucket heads are generated by the build script from
//! `strtab/const_strings.txt` and baked into the binary as statics. The
//! table is read-only: nothing here is ever inserted, removed, counted
//! toward the intern table load, or swept.

use crate::ConstStrId;
use crate::gc::GcHeader;
use crate::rivet_value::str_hash;

/// One precompiled string record.
#[derive(Debug)]
pub struct ConstStr {
    pub header: GcHeader,
    hash: u32,
    extra: u8,
    /// Next record in the same bucket
    next: Option<u16>,
    bytes: &'static [u8],
}

impl ConstStr {
    pub(crate) const fn new(
        bytes: &'static [u8],
        hash: u32,
        extra: u8,
        next: Option<u16>,
    ) -> Self {
        ConstStr {
            header: GcHeader::CONST,
            hash,
            extra,
            next,
            bytes,
        }
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &'static [u8] {
        self.bytes
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline(always)]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    #[inline(always)]
    pub fn extra(&self) -> u8 {
        self.extra
    }
}

include!(concat!(env!("OUT_DIR"), "/const_strtab_def.rs"));

/// Records addressable by a `u16` id.
pub const MAX_CONST_STRS: usize = u16::MAX as usize + 1;

/// Read-only overlay consulted before the dynamic intern table.
/// Cheap to copy; shared freely between runtime instances.
#[derive(Debug, Clone, Copy)]
pub struct ConstStringTable {
    entries: &'static [ConstStr],
    buckets: &'static [Option<u16>],
}

impl ConstStringTable {
    /// The table generated at build time.
    pub const fn builtin() -> Self {
        Self {
            entries: &CONST_STR_ENTRIES,
            buckets: &CONST_STR_BUCKETS,
        }
    }

    /// An overlay that never matches.
    pub const fn empty() -> Self {
        Self {
            entries: &[],
            buckets: &[],
        }
    }

    /// Wrap externally produced records. The layout is trusted as is, apart
    /// from the record count, which must fit a `ConstStrId`.
    pub const fn from_static(
        entries: &'static [ConstStr],
        buckets: &'static [Option<u16>],
    ) -> Self {
        assert!(
            entries.len() <= MAX_CONST_STRS,
            "const string table has more records than a ConstStrId can address"
        );
        Self { entries, buckets }
    }

    /// Number of records
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of buckets
    #[inline]
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn lookup(&self, bytes: &[u8]) -> Option<ConstStrId> {
        self.lookup_hashed(bytes, str_hash(bytes))
    }

    /// Probe bucket `hash % size` and walk its static chain for an exact match.
    pub fn lookup_hashed(&self, bytes: &[u8], hash: u32) -> Option<ConstStrId> {
        if self.buckets.is_empty() {
            return None;
        }
        let mut node = self.buckets[hash as usize % self.buckets.len()];
        while let Some(idx) = node {
            let s = self.entries.get(idx as usize)?;
            if s.bytes.len() == bytes.len() && s.bytes == bytes {
                return Some(ConstStrId(idx));
            }
            node = s.next;
        }
        None
    }

    #[inline(always)]
    pub fn get(&self, id: ConstStrId) -> Option<&'static ConstStr> {
        self.entries.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConstStrId, &'static ConstStr)> {
        self.entries
            .iter()
            .enumerate()
            // from_static bounds the record count to MAX_CONST_STRS
            .map(|(idx, s)| (ConstStrId(idx as u16), s))
    }
}

impl Default for ConstStringTable {
    fn default() -> Self {
        Self::builtin()
    }
}
