// Rivet Runtime
// Object core of an embeddable scripting runtime: tagged values, GC headers,
// interned short strings, long strings and the precompiled const string table

#[cfg(test)]
mod test;

pub mod gc;
pub mod rivet_value;
pub mod rivet_vm;

pub use gc::*;
pub use rivet_value::{NativeFunction, RivetValue, RivetValueKind, StringRef, str_hash};
pub use rivet_vm::{
    ConstString, RivetError, RivetResult, RivetVM, StringTableOption, VmOption,
};
