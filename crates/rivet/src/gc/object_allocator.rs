// Object allocator - single entry point for creating runtime strings
//
// Short strings are routed through the const overlay and the intern table,
// long strings get an independent allocation in their own pool. Every
// allocation is accounted with the collector before it happens.

use tracing::trace;

use crate::gc::{ConstStringTable, GC, GcHeader, GcPool, GcString, StringTable};
use crate::rivet_value::{StringRef, str_hash};
use crate::{RivetError, RivetResult, StringId, StringTableOption};

pub struct ObjectAllocator {
    strings: StringTable, // Private - use intern() to create short strings
    long_strings: GcPool<GcString>,
    const_strtab: ConstStringTable,
    short_max_len: usize,
}

#[cold]
#[track_caller]
fn dangling(s: StringRef) -> ! {
    panic!("string handle {s:?} does not refer to a live string")
}

impl ObjectAllocator {
    pub fn with_const_strtab(
        option: &StringTableOption,
        const_strtab: ConstStringTable,
        gc: &mut GC,
    ) -> RivetResult<Self> {
        option.validate()?;
        Ok(Self {
            strings: StringTable::new(option, gc)?,
            long_strings: GcPool::new(),
            const_strtab,
            short_max_len: option.short_max_len,
        })
    }

    // ==================== String creation ====================

    /// Materialize a string. Short content resolves to the const overlay or
    /// the intern table (deduplicated); longer content is always a fresh
    /// long string.
    pub fn intern(&mut self, gc: &mut GC, bytes: &[u8]) -> RivetResult<StringRef> {
        if bytes.len() > self.short_max_len {
            return self.create_long_string(gc, bytes);
        }
        let hash = str_hash(bytes);
        if let Some(id) = self.const_strtab.lookup_hashed(bytes, hash) {
            return Ok(StringRef::Const(id));
        }
        let id = self.strings.intern(gc, bytes, hash)?;
        Ok(StringRef::Short(id))
    }

    /// Independent allocation with a copy of `bytes`, never deduplicated.
    pub fn create_long_string(&mut self, gc: &mut GC, bytes: &[u8]) -> RivetResult<StringRef> {
        let mut data = Vec::new();
        data.try_reserve_exact(bytes.len())
            .map_err(|_| RivetError::OutOfMemory)?;
        data.extend_from_slice(bytes);
        self.alloc_long(gc, data.into_boxed_slice())
    }

    /// Long string of `len` zero bytes, to be filled in place through
    /// `long_string_bytes_mut`.
    pub fn create_long_string_uninit(&mut self, gc: &mut GC, len: usize) -> RivetResult<StringRef> {
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| RivetError::OutOfMemory)?;
        data.resize(len, 0);
        self.alloc_long(gc, data.into_boxed_slice())
    }

    fn alloc_long(&mut self, gc: &mut GC, data: Box<[u8]>) -> RivetResult<StringRef> {
        let size = GcString::alloc_size(data.len());
        gc.track_alloc(size)?;
        let len = data.len();
        match self.long_strings.alloc(GcString::new_long(data)) {
            Ok(id) => {
                trace!(index = id.index, len, "allocated long string");
                Ok(StringRef::Long(StringId(id)))
            }
            Err(e) => {
                gc.track_free(size);
                Err(e)
            }
        }
    }

    /// Mutable payload of a long string. Short and const strings are shared
    /// and never handed out mutably.
    pub fn long_string_bytes_mut(&mut self, s: StringRef) -> Option<&mut [u8]> {
        match s {
            StringRef::Long(id) => self.long_strings.get_mut(id.0).map(|s| &mut s.data[..]),
            _ => None,
        }
    }

    // ==================== Accessors ====================

    fn heap_string(&self, s: StringRef) -> Option<&GcString> {
        match s {
            StringRef::Short(id) => self.strings.get(id),
            StringRef::Long(id) => self.long_strings.get(id.0),
            StringRef::Const(_) => None,
        }
    }

    fn heap_string_mut(&mut self, s: StringRef) -> Option<&mut GcString> {
        match s {
            StringRef::Short(id) => self.strings.get_mut(id),
            StringRef::Long(id) => self.long_strings.get_mut(id.0),
            StringRef::Const(_) => None,
        }
    }

    /// Whether `s` still refers to a live (or const) string.
    pub fn contains(&self, s: StringRef) -> bool {
        match s {
            StringRef::Const(id) => self.const_strtab.get(id).is_some(),
            _ => self.heap_string(s).is_some(),
        }
    }

    #[track_caller]
    pub fn bytes(&self, s: StringRef) -> &[u8] {
        match s {
            StringRef::Const(id) => match self.const_strtab.get(id) {
                Some(c) => c.as_bytes(),
                None => dangling(s),
            },
            _ => match self.heap_string(s) {
                Some(h) => h.as_bytes(),
                None => dangling(s),
            },
        }
    }

    #[track_caller]
    pub fn len(&self, s: StringRef) -> usize {
        self.bytes(s).len()
    }

    /// Cached hash for short and const strings, recomputed for long ones.
    #[track_caller]
    pub fn hash(&self, s: StringRef) -> u32 {
        match s {
            StringRef::Const(id) => match self.const_strtab.get(id) {
                Some(c) => c.hash(),
                None => dangling(s),
            },
            _ => match self.heap_string(s) {
                Some(h) => h.hash(),
                None => dangling(s),
            },
        }
    }

    #[track_caller]
    pub fn extra(&self, s: StringRef) -> u8 {
        match s {
            StringRef::Const(id) => match self.const_strtab.get(id) {
                Some(c) => c.extra(),
                None => dangling(s),
            },
            _ => match self.heap_string(s) {
                Some(h) => h.extra(),
                None => dangling(s),
            },
        }
    }

    /// Const strings are immutable; setting their tag is a silent no-op.
    pub fn set_extra(&mut self, s: StringRef, extra: u8) {
        if let Some(h) = self.heap_string_mut(s) {
            h.extra = extra;
        }
    }

    /// Header of the object behind `s` (const strings report `GcHeader::CONST`).
    #[track_caller]
    pub fn header(&self, s: StringRef) -> GcHeader {
        match s {
            StringRef::Const(id) => match self.const_strtab.get(id) {
                Some(c) => c.header,
                None => dangling(s),
            },
            _ => match self.heap_string(s) {
                Some(h) => h.header,
                None => dangling(s),
            },
        }
    }

    /// Identity first; only two long strings are ever compared by content.
    /// A freed handle equals nothing but itself.
    pub fn equals(&self, a: StringRef, b: StringRef) -> bool {
        if a == b {
            return true;
        }
        let (Some(x), Some(y)) = (self.heap_string(a), self.heap_string(b)) else {
            return false;
        };
        match (a, b) {
            (StringRef::Long(_), StringRef::Long(_)) => x.len() == y.len() && x.data == y.data,
            _ => {
                // Distinct short handles must differ in content, or the
                // intern table has been bypassed somewhere.
                debug_assert!(
                    !(a.is_short() && b.is_short() && x.data == y.data),
                    "short strings {a:?} and {b:?} share content but not identity"
                );
                false
            }
        }
    }

    // ==================== GC participation ====================

    #[inline]
    pub fn mark(&mut self, s: StringRef) {
        match s {
            StringRef::Short(id) => self.strings.mark(id),
            StringRef::Long(id) => {
                if let Some(h) = self.long_strings.get_mut(id.0) {
                    h.header.mark();
                }
            }
            StringRef::Const(_) => {}
        }
    }

    /// Pin `s` for the lifetime of the runtime. No-op for const strings.
    pub fn fix(&mut self, s: StringRef) {
        if let Some(h) = self.heap_string_mut(s) {
            h.header.set_fixed();
        }
    }

    /// Free every unmarked, unpinned string, clearing marks on survivors.
    /// Returns the number of objects freed.
    pub fn sweep(&mut self, gc: &mut GC) -> usize {
        let short_freed = self.strings.sweep(gc);
        let long_freed = self.long_strings.sweep(
            |s| {
                if !s.header.is_collectable() {
                    return true;
                }
                if s.header.is_marked() {
                    s.header.clear_mark();
                    return true;
                }
                false
            },
            |dead| gc.track_free(dead.header.size),
        );
        short_freed + long_freed
    }

    // ==================== Introspection ====================

    #[inline]
    pub fn string_table(&self) -> &StringTable {
        &self.strings
    }

    #[inline]
    pub fn const_strtab(&self) -> &ConstStringTable {
        &self.const_strtab
    }

    #[inline]
    pub fn long_string_count(&self) -> usize {
        self.long_strings.len()
    }

    #[inline]
    pub fn short_max_len(&self) -> usize {
        self.short_max_len
    }
}
