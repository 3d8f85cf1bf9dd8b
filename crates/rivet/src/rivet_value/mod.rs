// Value representation: tagged values and string handles
mod rivet_string;
mod rivet_value;

pub use rivet_string::{StringRef, str_hash};
pub use rivet_value::{NativeFunction, RivetValue, RivetValueKind};
