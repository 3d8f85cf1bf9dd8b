//! Centralized runtime limits and tuning constants.
//!
//! All magic numbers that control string table and collector behavior
//! are collected here so they can be tuned in one place.

// ===== Strings =====

/// Maximum length for "short" strings (deduplicated through the intern table).
pub const SHORT_STR_MAX_LEN: usize = 64;

/// Reserved `slen` value marking a long string. No short string may have
/// this length, so every short-string threshold must stay below it.
pub const LONG_STRING_SLEN: u8 = 255;

// ===== String table =====

/// Initial bucket count of the intern table.
pub const STRTAB_INITIAL_SIZE: usize = 8;

/// Bucket count below which the intern table never shrinks.
pub const MIN_STRTAB_SIZE: usize = 8;

/// The table grows once `count > size * STRTAB_GROWTH_FACTOR`.
pub const STRTAB_GROWTH_FACTOR: usize = 4;

/// After a sweep the table shrinks once `count < size / STRTAB_SHRINK_DIVISOR`.
pub const STRTAB_SHRINK_DIVISOR: usize = 4;

// ===== Hashing (FNV-1a, 32 bit) =====

pub const FNV_OFFSET_BASIS: u32 = 2166136261;
pub const FNV_PRIME: u32 = 16777619;

// ===== Collector =====

/// Bytes that may be allocated after a collection before the next
/// allocation checkpoint triggers another one.
pub const GC_PAUSE_BYTES: usize = 256 * 1024;
