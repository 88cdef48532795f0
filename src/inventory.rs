//! Artifact inventory: the selectable listing for one watched directory.
//!
//! Entries are ephemeral; every rebuild is a full replacement from a fresh
//! directory listing, so no stale entry survives an external rename or
//! delete. The `loading` flag is mutated only by the swap coordinator.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::events::{EventBus, LoadOutcome, RuntimeEvent};
use crate::settings::SettingsStore;

/// What an inventory tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Model,
    Config,
}

/// One selectable artifact. Identity is the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub kind: ArtifactKind,
    pub loading: bool,
}

/// Ordered, de-duplicated listing of one directory's artifacts.
pub struct Inventory {
    kind: ArtifactKind,
    dir: PathBuf,
    extension: String,
    entries: RwLock<Vec<ArtifactEntry>>,
    settings: Arc<SettingsStore>,
    events: EventBus,
}

impl Inventory {
    /// `extension` is matched without its leading dot (e.g. `"onnx"`).
    pub fn new(
        kind: ArtifactKind,
        dir: PathBuf,
        extension: impl Into<String>,
        settings: Arc<SettingsStore>,
        events: EventBus,
    ) -> Self {
        Self {
            kind,
            dir,
            extension: extension.into(),
            entries: RwLock::new(Vec::new()),
            settings,
            events,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of a listed artifact.
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Rebuild the listing from the directory: clear-then-repopulate,
    /// filtered by extension, de-duplicated by name, in listing order.
    /// Returns the number of entries.
    ///
    /// Never touches the active selection; it only re-issues the
    /// "currently active" notification so observers can restore their
    /// highlighted row after an external change.
    pub fn rebuild(&self) -> io::Result<usize> {
        let mut listing: Vec<ArtifactEntry> = Vec::new();

        for dirent in std::fs::read_dir(&self.dir)? {
            let path = dirent?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if listing.iter().any(|e| e.name == name) {
                continue;
            }
            listing.push(ArtifactEntry {
                name: name.to_string(),
                kind: self.kind,
                loading: false,
            });
        }

        let count = listing.len();
        *self.entries.write() = listing;
        debug!(kind = ?self.kind, count, "inventory rebuilt");

        self.events.emit(RuntimeEvent::InventoryChanged { kind: self.kind });
        self.reconfirm_active();

        Ok(count)
    }

    /// Re-issue the active notification after a rebuild.
    fn reconfirm_active(&self) {
        match self.kind {
            ArtifactKind::Model => {
                // Only re-confirmed while the file is still listed; a
                // deleted active model leaves the marker unset.
                if let Some(active) = self.settings.active_model() {
                    if self.contains(&active) {
                        self.events.emit(RuntimeEvent::ActiveModelChanged {
                            name: active,
                            outcome: LoadOutcome::Loaded,
                        });
                    }
                }
            }
            ArtifactKind::Config => {
                // Known quirk, kept for compatibility: the config notifier
                // reports the last applied name verbatim even when that
                // file is no longer in the visible listing.
                if let Some(active) = self.settings.active_config() {
                    self.events
                        .emit(RuntimeEvent::ActiveConfigChanged { name: active });
                }
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().iter().any(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of the current listing, in order.
    pub fn snapshot(&self) -> Vec<ArtifactEntry> {
        self.entries.read().clone()
    }

    /// Mark one entry as loading, clearing any other loading mark of this
    /// kind first (at most one entry is ever loading). Returns false if
    /// the name is not listed.
    pub fn set_loading(&self, name: &str) -> bool {
        let mut entries = self.entries.write();
        for entry in entries.iter_mut() {
            entry.loading = false;
        }
        match entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.loading = true;
                true
            }
            None => false,
        }
    }

    /// Clear the loading mark wherever it is set. The entry may have been
    /// removed by a rebuild mid-load; that is not an error.
    pub fn clear_loading(&self) {
        for entry in self.entries.write().iter_mut() {
            entry.loading = false;
        }
    }

    /// True if any entry is marked loading.
    pub fn is_loading(&self) -> bool {
        self.entries.read().iter().any(|e| e.loading)
    }

    /// Name to show as active in a listing header.
    ///
    /// Model listings show the active name only while it is present;
    /// config listings keep showing the last applied name (see
    /// `reconfirm_active`).
    pub fn display_active(&self) -> Option<String> {
        match self.kind {
            ArtifactKind::Model => self
                .settings
                .active_model()
                .filter(|name| self.contains(name)),
            ArtifactKind::Config => self.settings.active_config(),
        }
    }
}
