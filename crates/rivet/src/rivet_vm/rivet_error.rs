use thiserror::Error;

/// Lightweight error enum - fits in two words and is `Copy`.
///
/// Running out of memory is the only failure the object core can hit while
/// materializing strings or resizing its tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RivetError {
    /// Allocation refused: the memory limit was reached or the allocator failed.
    #[error("resource exhausted: out of memory")]
    OutOfMemory,
    /// A runtime option failed validation.
    #[error("invalid option: {0}")]
    InvalidOption(&'static str),
}
