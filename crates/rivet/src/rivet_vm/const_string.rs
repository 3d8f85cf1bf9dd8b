use crate::gc::{GC, ObjectAllocator};
use crate::rivet_value::StringRef;
use crate::RivetResult;

/// Well-known names the runtime must never lose.
///
/// Created at bootstrap, before any collection can run, and pinned with
/// `fix`. When the const string table already provides a name the handle is
/// const and pinning is a no-op.
pub struct ConstString {
    pub str_init: StringRef,     // "init"
    pub str_deinit: StringRef,   // "deinit" - destructor name, must exist even when the heap is exhausted
    pub str_tostring: StringRef, // "tostring"
}

impl ConstString {
    pub fn new(allocator: &mut ObjectAllocator, gc: &mut GC) -> RivetResult<Self> {
        let mut fixed = |name: &str| -> RivetResult<StringRef> {
            let s = allocator.intern(gc, name.as_bytes())?;
            allocator.fix(s);
            Ok(s)
        };
        Ok(Self {
            str_init: fixed("init")?,
            str_deinit: fixed("deinit")?,
            str_tostring: fixed("tostring")?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = StringRef> {
        [self.str_init, self.str_deinit, self.str_tostring].into_iter()
    }
}
