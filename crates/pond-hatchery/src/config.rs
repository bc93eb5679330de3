//! Hatchery configuration

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default bound on contract extension depth
pub const DEFAULT_MAX_EXTENDS_DEPTH: usize = 64;

/// Hatchery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HatcheryConfig {
    /// Name of the in-memory module that owns synthesized adapter types
    pub module_name: String,
    /// Maximum depth of `extends` chains before a contract is rejected
    pub max_extends_depth: usize,
}

impl HatcheryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With module name
    #[inline]
    #[must_use]
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    /// With maximum extension depth
    #[inline]
    #[must_use]
    pub fn with_max_extends_depth(mut self, depth: usize) -> Self {
        self.max_extends_depth = depth;
        self
    }

    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// Returns the TOML error for malformed input.
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}

impl Default for HatcheryConfig {
    fn default() -> Self {
        Self {
            module_name: format!("DuckPond_{}", Uuid::new_v4()),
            max_extends_depth: DEFAULT_MAX_EXTENDS_DEPTH,
        }
    }
}
