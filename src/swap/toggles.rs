//! Toggle suspension for the swap window.
//!
//! The dependent toggles represent behaviors that must not run against a
//! half-initialized engine. They are forced off for the duration of a swap
//! attempt and restored to their pre-swap values exactly once, whichever
//! exit path the attempt takes.

use std::sync::Arc;

use tracing::debug;

use crate::settings::SettingsStore;

/// Toggles suspended while a swap is in progress.
pub const DEPENDENT_TOGGLES: &[&str] =
    &["tracking", "auto-trigger", "overlay", "confidence-display"];

/// RAII guard: captures the named toggles, forces them off, and writes the
/// captured values back when dropped.
pub struct ToggleGuard {
    settings: Arc<SettingsStore>,
    saved: Vec<(String, bool)>,
}

impl ToggleGuard {
    pub fn suspend(settings: &Arc<SettingsStore>, names: &[&str]) -> Self {
        let saved: Vec<(String, bool)> = names
            .iter()
            .map(|name| (name.to_string(), settings.toggle(name)))
            .collect();
        for name in names {
            settings.set_toggle(name, false);
        }
        debug!(count = saved.len(), "dependent toggles suspended");
        Self {
            settings: settings.clone(),
            saved,
        }
    }
}

impl Drop for ToggleGuard {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            self.settings.set_toggle(name, *value);
        }
        debug!(count = self.saved.len(), "dependent toggles restored");
    }
}
