// ============ Object IDs ============
// IDs address a slot in their owning arena plus the slot's generation, so a
// handle to a freed object never resolves to whatever reuses the slot.

/// Slot index plus the generation the slot had when the object was stored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct SlotId {
    pub index: u32,
    pub generation: u32,
}

impl SlotId {
    #[inline(always)]
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// Heap string inside its pool (short strings in the intern table pool,
/// long strings in the allocator's long-string pool).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct StringId(pub SlotId);

/// Index of a record in the precompiled const string table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct ConstStrId(pub u16);

impl StringId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0.index as usize
    }

    #[inline(always)]
    pub fn generation(self) -> u32 {
        self.0.generation
    }
}

impl ConstStrId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
