//! crates/nyaya_core/src/settings.rs
//!
//! The settings store is a shallow merge over two enum fields. Tier gating
//! for the Legal complexity mode is the caller's responsibility and is
//! enforced by the handler layer before this merge runs.

use crate::domain::{AppSettings, SettingsUpdate};

impl AppSettings {
    /// Merges the provided fields over the current state, leaving absent
    /// fields untouched.
    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(language) = update.language {
            self.language = language;
        }
        if let Some(complexity) = update.complexity {
            self.complexity = complexity;
        }
    }
}
