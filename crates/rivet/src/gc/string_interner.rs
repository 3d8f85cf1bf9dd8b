use tracing::{debug, trace, warn};

use crate::gc::{GC, GcPool, GcString};
use crate::rivet_vm::rivet_limits::STRTAB_SHRINK_DIVISOR;
use crate::{RivetError, RivetResult, StringId, StringTableOption};

/// Short string intern table.
///
/// Chained hash table keyed by content. Buckets hold the head of a singly
/// linked list threaded through the strings' own `next` field, so inserting
/// needs no node allocation and unlinking is an index rewrite.
///
/// Invariants:
/// - `buckets.len()` is a power of two and never below `min_size`
/// - every live short string sits in exactly one chain, the one at
///   `hash & (size - 1)`
/// - no two live entries have equal content
pub struct StringTable {
    buckets: Vec<Option<StringId>>,
    strings: GcPool<GcString>,
    count: usize,
    min_size: usize,
    growth_factor: usize,
}

impl StringTable {
    pub fn new(option: &StringTableOption, gc: &mut GC) -> RivetResult<Self> {
        let mut table = Self {
            buckets: Vec::new(),
            strings: GcPool::new(),
            count: 0,
            min_size: option.min_size,
            growth_factor: option.growth_factor,
        };
        table.resize(gc, option.initial_size)?;
        Ok(table)
    }

    /// Number of buckets
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    /// Number of live entries
    #[inline(always)]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline(always)]
    fn bucket_index(&self, hash: u32) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    #[inline(always)]
    pub fn get(&self, id: StringId) -> Option<&GcString> {
        self.strings.get(id.0)
    }

    #[inline(always)]
    pub fn get_mut(&mut self, id: StringId) -> Option<&mut GcString> {
        self.strings.get_mut(id.0)
    }

    fn bucket_bytes(size: usize) -> usize {
        size * std::mem::size_of::<Option<StringId>>()
    }

    /// Scan the chain for `hash` comparing length then bytes.
    pub fn find(&self, bytes: &[u8], hash: u32) -> Option<StringId> {
        let mut node = self.buckets[self.bucket_index(hash)];
        while let Some(id) = node {
            let s = self.strings.get(id.0)?;
            if s.len() == bytes.len() && *s.data == *bytes {
                return Some(id);
            }
            node = s.next;
        }
        None
    }

    /// Return the entry for `bytes`, creating it on a miss.
    /// `hash` must be the FNV-1a hash of `bytes`.
    pub fn intern(&mut self, gc: &mut GC, bytes: &[u8], hash: u32) -> RivetResult<StringId> {
        if let Some(id) = self.find(bytes, hash) {
            return Ok(id);
        }
        self.insert_new(gc, bytes, hash)
    }

    /// Insert content known to be absent from the table.
    fn insert_new(&mut self, gc: &mut GC, bytes: &[u8], hash: u32) -> RivetResult<StringId> {
        // Grow before allocating so a failed resize leaves nothing half done.
        // Ends in the same state as growing right after the count crosses the limit.
        if self.count + 1 > self.size() * self.growth_factor {
            self.resize(gc, self.size() << 1)?;
        }

        let mut data = Vec::new();
        data.try_reserve_exact(bytes.len())
            .map_err(|_| RivetError::OutOfMemory)?;
        data.extend_from_slice(bytes);

        gc.track_alloc(GcString::alloc_size(bytes.len()))?;
        let mut s = GcString::new_short(data.into_boxed_slice(), hash);
        let idx = self.bucket_index(hash);
        s.next = self.buckets[idx];
        let id = match self.strings.alloc(s) {
            Ok(id) => StringId(id),
            Err(e) => {
                gc.track_free(GcString::alloc_size(bytes.len()));
                return Err(e);
            }
        };
        self.buckets[idx] = Some(id);
        self.count += 1;

        trace!(index = id.0.index, len = bytes.len(), hash, "interned short string");
        Ok(id)
    }

    /// Rebuild the bucket array with `new_size` buckets and relink every
    /// live entry at `hash & (new_size - 1)`.
    pub fn resize(&mut self, gc: &mut GC, new_size: usize) -> RivetResult<()> {
        debug_assert!(new_size.is_power_of_two());
        let old_size = self.size();

        let mut buckets: Vec<Option<StringId>> = Vec::new();
        buckets
            .try_reserve_exact(new_size)
            .map_err(|_| RivetError::OutOfMemory)?;
        buckets.resize(new_size, None);
        gc.track_realloc(Self::bucket_bytes(old_size), Self::bucket_bytes(new_size))?;

        let old_buckets = std::mem::replace(&mut self.buckets, buckets);
        for head in old_buckets {
            let mut node = head;
            while let Some(id) = node {
                let Some(s) = self.strings.get_mut(id.0) else {
                    break;
                };
                node = s.next;
                let idx = s.hash as usize & (new_size - 1);
                s.next = self.buckets[idx];
                self.buckets[idx] = Some(id);
            }
        }

        debug!(old_size, new_size, count = self.count, "string table resized");
        Ok(())
    }

    /// Mark an entry reachable for the current cycle.
    #[inline]
    pub fn mark(&mut self, id: StringId) {
        if let Some(s) = self.strings.get_mut(id.0) {
            s.header.mark();
        }
    }

    /// Reclaim every entry that is neither fixed nor marked, clear the marks
    /// of survivors, then shrink the table if it fell below a quarter load.
    /// Returns the number of entries freed.
    pub fn sweep(&mut self, gc: &mut GC) -> usize {
        let mut freed = 0;
        for idx in 0..self.buckets.len() {
            let mut prev: Option<StringId> = None;
            let mut node = self.buckets[idx];
            while let Some(id) = node {
                let Some(s) = self.strings.get_mut(id.0) else {
                    break;
                };
                node = s.next;
                if s.header.is_fixed() {
                    prev = Some(id);
                    continue;
                }
                if s.header.is_marked() {
                    s.header.clear_mark();
                    prev = Some(id);
                    continue;
                }

                // unlink
                match prev {
                    Some(p) => {
                        if let Some(prev_str) = self.strings.get_mut(p.0) {
                            prev_str.next = node;
                        }
                    }
                    None => self.buckets[idx] = node,
                }
                if let Some(dead) = self.strings.free(id.0) {
                    gc.track_free(dead.header.size);
                }
                self.count -= 1;
                freed += 1;
            }
        }

        let size = self.size();
        if self.count < size / STRTAB_SHRINK_DIVISOR && size > self.min_size {
            if let Err(e) = self.resize(gc, size >> 1) {
                warn!(error = %e, size, "string table shrink skipped");
            }
        }
        freed
    }

    /// Live entries in chain order.
    pub fn iter(&self) -> StringTableIter<'_> {
        StringTableIter {
            table: self,
            bucket: 0,
            node: None,
        }
    }

    /// Length of the chain at bucket `idx` (diagnostics and tests).
    pub fn chain_len(&self, idx: usize) -> usize {
        let mut len = 0;
        let mut node = self.buckets.get(idx).copied().flatten();
        while let Some(id) = node {
            len += 1;
            node = self.strings.get(id.0).and_then(|s| s.next);
        }
        len
    }
}

pub struct StringTableIter<'a> {
    table: &'a StringTable,
    bucket: usize,
    node: Option<StringId>,
}

impl<'a> Iterator for StringTableIter<'a> {
    type Item = (StringId, &'a GcString);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.node {
                let s = self.table.strings.get(id.0)?;
                self.node = s.next;
                return Some((id, s));
            }
            if self.bucket >= self.table.buckets.len() {
                return None;
            }
            self.node = self.table.buckets[self.bucket];
            self.bucket += 1;
        }
    }
}
