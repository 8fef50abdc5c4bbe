use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RelCacheError, Result};
use crate::storage::relids::{GrowthPolicy, DEFAULT_GROWTH_FACTOR, DEFAULT_INITIAL_BLOCK_BYTES};

/// Configuration for relationship id caching.
///
/// Can be built in code with the setter methods or read from TOML:
///
/// ```toml
/// initial_block_bytes = 32
/// growth_factor = 2
/// shrink_after_load = false
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelIdOptions {
    /// Capacity in bytes of a block allocated for the first id of a direction.
    pub initial_block_bytes: usize,
    /// Capacity multiplier applied when a block runs out of space.
    pub growth_factor: usize,
    /// Whether arrays are trimmed to their written length after each load round.
    pub shrink_after_load: bool,
}

impl Default for RelIdOptions {
    fn default() -> Self {
        Self {
            initial_block_bytes: DEFAULT_INITIAL_BLOCK_BYTES,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            shrink_after_load: true,
        }
    }
}

impl RelIdOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial block capacity.
    pub fn initial_block_bytes(mut self, bytes: usize) -> Self {
        self.initial_block_bytes = bytes;
        self
    }

    /// Sets the growth factor.
    pub fn growth_factor(mut self, factor: usize) -> Self {
        self.growth_factor = factor;
        self
    }

    /// Enables or disables shrinking after each load round.
    pub fn shrink_after_load(mut self, enabled: bool) -> Self {
        self.shrink_after_load = enabled;
        self
    }

    /// Parses and validates options from a TOML document.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let options: Self = toml::from_str(src)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Checks that the options describe a usable growth policy.
    pub fn validate(&self) -> Result<()> {
        if self.initial_block_bytes == 0 {
            return Err(RelCacheError::InvalidConfig(
                "initial_block_bytes must be at least 1".into(),
            ));
        }
        if self.growth_factor < 2 {
            return Err(RelCacheError::InvalidConfig(format!(
                "growth_factor must be at least 2 (got {})",
                self.growth_factor
            )));
        }
        Ok(())
    }

    /// The block sizing rules these options describe.
    pub fn growth_policy(&self) -> GrowthPolicy {
        GrowthPolicy {
            initial_capacity: self.initial_block_bytes,
            growth_factor: self.growth_factor,
        }
    }
}
