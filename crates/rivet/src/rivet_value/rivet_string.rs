use crate::rivet_vm::rivet_limits::{FNV_OFFSET_BASIS, FNV_PRIME};
use crate::{ConstStrId, StringId};

/// FNV-1a (32 bit) over the raw bytes, content only.
#[inline]
pub const fn str_hash(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash = (hash ^ bytes[i] as u32).wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// Handle to a runtime string.
///
/// Equality on handles is object identity. Because every short string goes
/// through the intern table, identity of short handles (including const
/// ones) coincides with content equality; long strings need
/// `RivetVM::equals` for a content comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringRef {
    /// Deduplicated string owned by the intern table
    Short(StringId),
    /// Independently allocated string above the short limit
    Long(StringId),
    /// Record of the precompiled const string table
    Const(ConstStrId),
}

impl StringRef {
    /// Short and const strings are both deduplicated.
    #[inline(always)]
    pub fn is_short(self) -> bool {
        !self.is_long()
    }

    #[inline(always)]
    pub fn is_long(self) -> bool {
        matches!(self, StringRef::Long(_))
    }

    #[inline(always)]
    pub fn is_const(self) -> bool {
        matches!(self, StringRef::Const(_))
    }
}
