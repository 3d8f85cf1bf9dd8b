// Garbage collection for the object core
//
// Stop-the-world mark & sweep driven from allocation checkpoints:
// - Every allocation is accounted through track_alloc / track_realloc /
//   track_free, the runtime's host allocator boundary. Sizes are always
//   explicit because objects keep no other size bookkeeping.
// - Allocation pays down `gc_debt`; once it is exhausted `should_collect`
//   reports allocation pressure and the owner runs a full cycle.
// - A cycle marks the roots, then sweeps the intern table and the long
//   string pool in one uninterrupted pass.
//
// GC States:
// - Pause: between cycles, mutator running
// - Propagate: marking roots
// - Sweep: reclaiming unmarked objects; no interning may happen here

mod const_strtab;
mod gc_id;
mod gc_object;
mod object_allocator;
mod object_pool;
mod string_interner;

pub use const_strtab::*;
pub use gc_id::*;
pub use gc_object::*;
pub use object_allocator::*;
pub use object_pool::*;
pub use string_interner::*;

use tracing::debug;

use crate::rivet_value::RivetValue;
use crate::{RivetError, RivetResult, VmOption};

/// GC state machine
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcState {
    Pause = 0,
    Propagate = 1,
    Sweep = 2,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GcStats {
    pub collection_count: usize,
    pub objects_collected: usize,
    pub bytes_allocated: usize,
    pub bytes_freed: usize,
}

/// Garbage collector
pub struct GC {
    pub gc_state: GcState,

    /// Bytes currently allocated by the object core
    pub total_bytes: usize,

    /// Allocation budget left before the next collection.
    /// Allocation decreases it; a collection runs once it reaches zero.
    pub gc_debt: isize,

    /// Collections suppressed (bootstrap, explicit stop)
    pub gc_stopped: bool,

    pause_bytes: usize,
    max_memory_limit: usize,

    pub stats: GcStats,
}

impl GC {
    pub fn new(option: &VmOption) -> Self {
        GC {
            gc_state: GcState::Pause,
            total_bytes: 0,
            gc_debt: option.gc_pause_bytes as isize,
            gc_stopped: false,
            pause_bytes: option.gc_pause_bytes,
            max_memory_limit: option.max_memory_limit,
            stats: GcStats::default(),
        }
    }

    // ============ Host allocator boundary ============

    /// Account for a new allocation of `size` bytes. Fails without side
    /// effects if it would exceed the memory limit.
    #[inline]
    pub fn track_alloc(&mut self, size: usize) -> RivetResult<()> {
        let total = self
            .total_bytes
            .checked_add(size)
            .ok_or(RivetError::OutOfMemory)?;
        if total > self.max_memory_limit {
            return Err(RivetError::OutOfMemory);
        }
        self.total_bytes = total;
        self.gc_debt -= size as isize;
        self.stats.bytes_allocated += size;
        Ok(())
    }

    /// Account for resizing a block from `old_size` to `new_size` bytes.
    #[inline]
    pub fn track_realloc(&mut self, old_size: usize, new_size: usize) -> RivetResult<()> {
        if new_size >= old_size {
            self.track_alloc(new_size - old_size)
        } else {
            self.track_free(old_size - new_size);
            Ok(())
        }
    }

    /// Account for releasing a block of `size` bytes.
    #[inline]
    pub fn track_free(&mut self, size: usize) {
        debug_assert!(size <= self.total_bytes, "freeing more than was allocated");
        self.total_bytes = self.total_bytes.saturating_sub(size);
        self.gc_debt += size as isize;
        self.stats.bytes_freed += size;
    }

    /// Allocation pressure hook: true once the budget is spent.
    #[inline]
    pub fn should_collect(&self) -> bool {
        !self.gc_stopped && self.gc_debt <= 0
    }

    /// Grant a fresh allocation budget after a cycle.
    pub fn set_pause(&mut self) {
        self.gc_debt = self.pause_bytes as isize;
    }

    pub fn set_max_memory_limit(&mut self, limit: usize) {
        self.max_memory_limit = limit;
    }

    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    // ============ Mark & sweep ============

    /// Mark the object a value refers to, if any.
    #[inline]
    pub fn mark_value(&mut self, pool: &mut ObjectAllocator, value: &RivetValue) {
        if let RivetValue::String(s) = value {
            pool.mark(*s);
        }
    }

    /// Run the sweep half of a cycle. Marks must already be set.
    pub fn sweep(&mut self, pool: &mut ObjectAllocator) -> usize {
        self.gc_state = GcState::Sweep;
        let freed = pool.sweep(self);
        self.gc_state = GcState::Pause;
        self.stats.objects_collected += freed;
        freed
    }

    /// Full stop-the-world cycle over `roots`. Returns the number of
    /// objects freed.
    pub fn full_gc(&mut self, roots: &[RivetValue], pool: &mut ObjectAllocator) -> usize {
        let bytes_before = self.total_bytes;

        self.gc_state = GcState::Propagate;
        for value in roots {
            self.mark_value(pool, value);
        }

        let freed = self.sweep(pool);
        self.stats.collection_count += 1;
        self.set_pause();

        debug!(
            freed,
            bytes_freed = bytes_before.saturating_sub(self.total_bytes),
            total_bytes = self.total_bytes,
            strtab_size = pool.string_table().size(),
            strtab_count = pool.string_table().count(),
            "full gc finished"
        );
        freed
    }
}
