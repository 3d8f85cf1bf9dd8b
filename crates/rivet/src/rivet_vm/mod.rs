// Rivet runtime context
// Owns the object allocator (intern table, long strings, const overlay),
// the collector and the value stack that forms the root set.
mod const_string;
mod rivet_error;
pub mod rivet_limits;
mod vm_option;

pub use const_string::ConstString;
pub use rivet_error::RivetError;
pub use vm_option::{StringTableOption, VmOption};

use tracing::debug;

use crate::gc::{ConstStringTable, GC, GcHeader, GcStats, ObjectAllocator};
use crate::rivet_value::{RivetValue, StringRef};

pub type RivetResult<T> = Result<T, RivetError>;

pub struct RivetVM {
    // Object allocator: every string is created through here
    pub(crate) object_allocator: ObjectAllocator,

    // Garbage collector (cold path - only accessed during accounting and cycles)
    pub(crate) gc: GC,

    // Pinned well-known names
    pub(crate) const_strings: ConstString,

    // Value stack; everything on it is a GC root
    stack: Vec<RivetValue>,

    option: VmOption,
}

impl RivetVM {
    pub fn new(option: VmOption) -> RivetResult<Self> {
        let const_strtab = if option.string_table.use_const_strtab {
            ConstStringTable::builtin()
        } else {
            ConstStringTable::empty()
        };
        Self::with_const_strtab(option, const_strtab)
    }

    /// Build a runtime over a specific precompiled string table.
    pub fn with_const_strtab(
        option: VmOption,
        const_strtab: ConstStringTable,
    ) -> RivetResult<Self> {
        option.validate()?;
        let mut gc = GC::new(&option);
        let mut object_allocator =
            ObjectAllocator::with_const_strtab(&option.string_table, const_strtab, &mut gc)?;

        // Pin the well-known names before any collection can run
        gc.gc_stopped = true;
        let const_strings = ConstString::new(&mut object_allocator, &mut gc)?;
        gc.gc_stopped = false;

        Ok(RivetVM {
            object_allocator,
            gc,
            const_strings,
            stack: Vec::with_capacity(16),
            option,
        })
    }

    pub fn option(&self) -> &VmOption {
        &self.option
    }

    // ==================== String creation ====================

    /// Materialize `bytes` as a runtime string. Content of at most
    /// `short_max_len` bytes always yields the one canonical handle for that
    /// content; longer content yields a new long string.
    ///
    /// This is an allocation checkpoint and may run a collection; the
    /// returned string survives it, other unrooted handles may not.
    pub fn intern(&mut self, bytes: &[u8]) -> RivetResult<StringRef> {
        let s = self.object_allocator.intern(&mut self.gc, bytes)?;
        self.check_gc_with(Some(s));
        Ok(s)
    }

    #[inline]
    pub fn new_str(&mut self, s: &str) -> RivetResult<StringRef> {
        self.intern(s.as_bytes())
    }

    /// A long string regardless of length, never deduplicated.
    pub fn new_long_string(&mut self, bytes: &[u8]) -> RivetResult<StringRef> {
        let s = self
            .object_allocator
            .create_long_string(&mut self.gc, bytes)?;
        self.check_gc_with(Some(s));
        Ok(s)
    }

    /// A zero-filled long string of `len` bytes for incremental building.
    pub fn new_long_string_uninit(&mut self, len: usize) -> RivetResult<StringRef> {
        let s = self
            .object_allocator
            .create_long_string_uninit(&mut self.gc, len)?;
        self.check_gc_with(Some(s));
        Ok(s)
    }

    /// Payload of a long string, writable in place. `None` for other strings.
    pub fn long_string_bytes_mut(&mut self, s: StringRef) -> Option<&mut [u8]> {
        self.object_allocator.long_string_bytes_mut(s)
    }

    // ==================== String access ====================

    #[inline]
    #[track_caller]
    pub fn length(&self, s: StringRef) -> usize {
        self.object_allocator.len(s)
    }

    /// Valid only while `s` is alive.
    #[inline]
    #[track_caller]
    pub fn raw_bytes(&self, s: StringRef) -> &[u8] {
        self.object_allocator.bytes(s)
    }

    /// The string as UTF-8, if it is valid UTF-8.
    #[track_caller]
    pub fn to_str(&self, s: StringRef) -> Option<&str> {
        std::str::from_utf8(self.raw_bytes(s)).ok()
    }

    #[inline]
    pub fn equals(&self, a: StringRef, b: StringRef) -> bool {
        self.object_allocator.equals(a, b)
    }

    #[inline]
    #[track_caller]
    pub fn hash(&self, s: StringRef) -> u32 {
        self.object_allocator.hash(s)
    }

    #[inline]
    #[track_caller]
    pub fn extra(&self, s: StringRef) -> u8 {
        self.object_allocator.extra(s)
    }

    #[inline]
    pub fn set_extra(&mut self, s: StringRef, extra: u8) {
        self.object_allocator.set_extra(s, extra);
    }

    pub fn is_alive(&self, s: StringRef) -> bool {
        self.object_allocator.contains(s)
    }

    /// Raw equality of two values: identity, except that two long strings
    /// compare by content.
    pub fn raw_equal(&self, a: &RivetValue, b: &RivetValue) -> bool {
        match (a, b) {
            (RivetValue::String(x), RivetValue::String(y)) => self.equals(*x, *y),
            _ => a == b,
        }
    }

    // ==================== GC header protocol ====================

    #[track_caller]
    pub fn header(&self, s: StringRef) -> GcHeader {
        self.object_allocator.header(s)
    }

    #[track_caller]
    pub fn is_const(&self, s: StringRef) -> bool {
        self.header(s).is_const()
    }

    #[track_caller]
    pub fn is_fixed(&self, s: StringRef) -> bool {
        self.header(s).is_fixed()
    }

    #[track_caller]
    pub fn is_marked(&self, s: StringRef) -> bool {
        self.header(s).is_marked()
    }

    /// Root tracing entry point: flag `s` reachable for the current cycle.
    #[inline]
    pub fn mark(&mut self, s: StringRef) {
        self.object_allocator.mark(s);
    }

    /// Pin `s` for the lifetime of this runtime.
    #[inline]
    pub fn fix(&mut self, s: StringRef) {
        self.object_allocator.fix(s);
    }

    /// Sweep entry point, once per cycle after marking. Returns the number
    /// of strings freed.
    pub fn sweep(&mut self) -> usize {
        self.gc.sweep(&mut self.object_allocator)
    }

    // ==================== Roots & collection ====================

    #[inline]
    pub fn push(&mut self, value: RivetValue) {
        self.stack.push(value);
    }

    #[inline]
    pub fn pop(&mut self) -> Option<RivetValue> {
        self.stack.pop()
    }

    #[inline]
    pub fn stack(&self) -> &[RivetValue] {
        &self.stack
    }

    pub fn truncate_stack(&mut self, len: usize) {
        self.stack.truncate(len);
    }

    /// Mark everything on the stack and sweep. Returns objects freed.
    pub fn full_gc(&mut self) -> usize {
        self.gc.full_gc(&self.stack, &mut self.object_allocator)
    }

    /// Allocation checkpoint: collect if the allocation budget is spent.
    /// Returns whether a collection ran.
    pub fn check_gc(&mut self) -> bool {
        self.check_gc_with(None)
    }

    fn check_gc_with(&mut self, fresh: Option<StringRef>) -> bool {
        if !self.option.gc_auto || !self.gc.should_collect() {
            return false;
        }
        if let Some(s) = fresh {
            self.object_allocator.mark(s);
        }
        self.full_gc();
        true
    }

    pub fn stop_gc(&mut self) {
        self.gc.gc_stopped = true;
    }

    pub fn restart_gc(&mut self) {
        self.gc.gc_stopped = false;
    }

    // ==================== Introspection ====================

    pub fn const_strings(&self) -> &ConstString {
        &self.const_strings
    }

    /// Live entries in the intern table
    pub fn string_count(&self) -> usize {
        self.object_allocator.string_table().count()
    }

    /// Bucket count of the intern table
    pub fn string_table_size(&self) -> usize {
        self.object_allocator.string_table().size()
    }

    pub fn long_string_count(&self) -> usize {
        self.object_allocator.long_string_count()
    }

    pub fn object_allocator(&self) -> &ObjectAllocator {
        &self.object_allocator
    }

    pub fn gc_stats(&self) -> &GcStats {
        self.gc.stats()
    }

    pub fn total_bytes(&self) -> usize {
        self.gc.total_bytes
    }

    pub fn set_memory_limit(&mut self, limit: usize) {
        self.gc.set_max_memory_limit(limit);
    }
}

impl Drop for RivetVM {
    fn drop(&mut self) {
        debug!(
            strings = self.string_count(),
            long_strings = self.long_string_count(),
            total_bytes = self.gc.total_bytes,
            collections = self.gc.stats.collection_count,
            "runtime closed"
        );
    }
}
