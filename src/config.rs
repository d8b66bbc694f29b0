// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Builder-style configuration for an [crate::Uploader].

use crate::imp::TextureMode;

/// Number of caches when nothing else is configured.
///
/// Small on purpose: exhausting the pool is how a host finds out it isn't releasing.
pub const DEFAULT_CAPACITY: usize = 200;

/// Rows written per advance when nothing else is configured.
pub const DEFAULT_ROW_BUDGET: usize = 256;

/// Settings fixed when an uploader is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderConfig {
    capacity: usize,
    default_row_budget: usize,
    texture_mode: TextureMode,
    hardened: bool,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_row_budget: DEFAULT_ROW_BUDGET,
            texture_mode: TextureMode::default(),
            hardened: false,
        }
    }
}

impl UploaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of caches.  The pool never grows past this.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the row budget new caches start with.  Clamped to at least 1.
    pub fn with_default_row_budget(mut self, rows: usize) -> Self {
        self.default_row_budget = rows.max(1);
        self
    }

    /// Set how owned textures are created.
    pub fn with_texture_mode(mut self, mode: TextureMode) -> Self {
        self.texture_mode = mode;
        self
    }

    /**
    Refuse all further calls once an internal inconsistency has been seen.

    Without this, an inconsistency only fails the call that hit it.
    */
    pub fn hardened(mut self, hardened: bool) -> Self {
        self.hardened = hardened;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_row_budget(&self) -> usize {
        self.default_row_budget
    }

    pub fn texture_mode(&self) -> TextureMode {
        self.texture_mode
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = UploaderConfig::new();
        assert_eq!(config.capacity(), 200);
        assert_eq!(config.default_row_budget(), 256);
        assert_eq!(config.texture_mode(), TextureMode::RenderTarget);
        assert!(!config.is_hardened());
    }

    #[test]
    fn budget_is_clamped() {
        assert_eq!(UploaderConfig::new().with_default_row_budget(0).default_row_budget(), 1);
    }
}
