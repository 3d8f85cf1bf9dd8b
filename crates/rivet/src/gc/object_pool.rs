// Slot arena for GC objects
//
// - IDs are slot indices tagged with the slot's generation
// - Freed slots go to a free list and are reused by the next allocation;
//   freeing bumps the generation so stale IDs stop resolving
// - Sweeping is a linear scan over occupied slots, no pointer chasing

use crate::gc::SlotId;
use crate::{RivetError, RivetResult};

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub struct GcPool<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> GcPool<T> {
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Store a new object and return its slot ID.
    /// Recycles the most recently freed slot before growing the arena.
    pub fn alloc(&mut self, value: T) -> RivetResult<SlotId> {
        if let Some(free_idx) = self.free_list.pop() {
            let slot = &mut self.slots[free_idx as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            self.live += 1;
            return Ok(SlotId::new(free_idx, slot.generation));
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| RivetError::OutOfMemory)?;
        self.slots
            .try_reserve(1)
            .map_err(|_| RivetError::OutOfMemory)?;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        self.live += 1;
        Ok(SlotId::new(index, 0))
    }

    #[inline(always)]
    pub fn get(&self, id: SlotId) -> Option<&T> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    #[inline(always)]
    pub fn get_mut(&mut self, id: SlotId) -> Option<&mut T> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Release a slot, handing back the object it held.
    pub fn free(&mut self, id: SlotId) -> Option<T> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.live -= 1;
        Some(value)
    }

    /// Number of live objects
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[inline]
    pub fn free_list_len(&self) -> usize {
        self.free_list.len()
    }

    /// Linear sweep: objects for which `keep` returns false are removed and
    /// passed to `on_free`. Returns how many objects were freed.
    pub fn sweep(
        &mut self,
        mut keep: impl FnMut(&mut T) -> bool,
        mut on_free: impl FnMut(T),
    ) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(obj) = slot.value.as_mut() else {
                continue;
            };
            if keep(obj) {
                continue;
            }
            if let Some(dead) = slot.value.take() {
                on_free(dead);
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
                self.live -= 1;
                freed += 1;
            }
        }
        freed
    }
}

impl<T> Default for GcPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
