use crate::rivet_vm::rivet_limits::{
    GC_PAUSE_BYTES, LONG_STRING_SLEN, MIN_STRTAB_SIZE, SHORT_STR_MAX_LEN, STRTAB_GROWTH_FACTOR,
    STRTAB_INITIAL_SIZE,
};
use crate::{RivetError, RivetResult};

/// Intern table tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StringTableOption {
    /// Bucket count at startup (power of two)
    pub initial_size: usize,
    /// Shrink floor (power of two)
    pub min_size: usize,
    /// Grow once `count > size * growth_factor`
    pub growth_factor: usize,
    /// Longest string that is still deduplicated
    pub short_max_len: usize,
    /// Consult the precompiled const string table before the dynamic table
    pub use_const_strtab: bool,
}

impl Default for StringTableOption {
    fn default() -> Self {
        Self {
            initial_size: STRTAB_INITIAL_SIZE,
            min_size: MIN_STRTAB_SIZE,
            growth_factor: STRTAB_GROWTH_FACTOR,
            short_max_len: SHORT_STR_MAX_LEN,
            use_const_strtab: true,
        }
    }
}

impl StringTableOption {
    pub fn validate(&self) -> RivetResult<()> {
        if !self.min_size.is_power_of_two() {
            return Err(RivetError::InvalidOption("min_size must be a power of two"));
        }
        if !self.initial_size.is_power_of_two() {
            return Err(RivetError::InvalidOption(
                "initial_size must be a power of two",
            ));
        }
        if self.initial_size < self.min_size {
            return Err(RivetError::InvalidOption(
                "initial_size must not be below min_size",
            ));
        }
        if self.growth_factor == 0 {
            return Err(RivetError::InvalidOption("growth_factor must be at least 1"));
        }
        if self.short_max_len >= LONG_STRING_SLEN as usize {
            return Err(RivetError::InvalidOption(
                "short_max_len collides with the long string marker",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VmOption {
    pub string_table: StringTableOption,
    /// Maximum memory limit in bytes
    pub max_memory_limit: usize,
    /// Allocation budget between two automatic collections
    pub gc_pause_bytes: usize,
    /// Run a collection at allocation checkpoints once the budget is spent
    pub gc_auto: bool,
}

impl Default for VmOption {
    fn default() -> Self {
        Self {
            string_table: StringTableOption::default(),
            max_memory_limit: usize::MAX,
            gc_pause_bytes: GC_PAUSE_BYTES,
            gc_auto: true,
        }
    }
}

impl VmOption {
    pub fn validate(&self) -> RivetResult<()> {
        self.string_table.validate()?;
        if self.gc_pause_bytes == 0 {
            return Err(RivetError::InvalidOption("gc_pause_bytes must be positive"));
        }
        Ok(())
    }

    /// Parse options from JSON; missing fields take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> RivetResult<Self> {
        let option: VmOption = serde_json::from_str(text)
            .map_err(|_| RivetError::InvalidOption("malformed option json"))?;
        option.validate()?;
        Ok(option)
    }
}
