//! Shared runtime-settings store.
//!
//! Process-wide state consumed by the inference engine's dependents:
//! feature toggles, the value map written by config applies, the active
//! artifact selection, and the configured execution backend. The store is
//! explicitly owned and passed by `Arc` to the components that need it;
//! every write goes through a named method so mutation sites stay
//! auditable.
//!
//! The active selection is written only by the swap coordinator (models)
//! and the apply pipeline (configs).

use std::collections::HashMap;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::engine::ExecutionBackend;

/// Which artifact names are currently active, if any.
///
/// The original system tracked "last loaded" and "active" as one datum;
/// this keeps them unified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSelection {
    pub model: Option<String>,
    pub config: Option<String>,
}

/// Process-wide settings store. Cheap to share, internally synchronized.
pub struct SettingsStore {
    toggles: DashMap<String, bool>,
    values: RwLock<HashMap<String, Value>>,
    selection: RwLock<ActiveSelection>,
    backend: RwLock<ExecutionBackend>,
}

impl SettingsStore {
    pub fn new(backend: ExecutionBackend) -> Self {
        Self {
            toggles: DashMap::new(),
            values: RwLock::new(HashMap::new()),
            selection: RwLock::new(ActiveSelection::default()),
            backend: RwLock::new(backend),
        }
    }

    /// Current value of a toggle; unknown toggles read as disabled.
    pub fn toggle(&self, name: &str) -> bool {
        self.toggles.get(name).map(|v| *v).unwrap_or(false)
    }

    pub fn set_toggle(&self, name: &str, value: bool) {
        self.toggles.insert(name.to_string(), value);
    }

    /// One decoded setting value, if present.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    /// Number of entries in the value map.
    pub fn value_count(&self) -> usize {
        self.values.read().len()
    }

    /// Snapshot of the whole value map.
    pub fn values_snapshot(&self) -> HashMap<String, Value> {
        self.values.read().clone()
    }

    /// Merge a fully decoded staging map into the value map under one
    /// write section. Callers must decode completely before calling, so a
    /// failed decode never leaves a partial write behind.
    pub fn commit_values(&self, staged: HashMap<String, Value>) {
        let mut values = self.values.write();
        for (key, value) in staged {
            values.insert(key, value);
        }
    }

    pub fn active_model(&self) -> Option<String> {
        self.selection.read().model.clone()
    }

    /// Written only by the swap coordinator.
    pub fn set_active_model(&self, name: Option<&str>) {
        self.selection.write().model = name.map(str::to_string);
    }

    pub fn active_config(&self) -> Option<String> {
        self.selection.read().config.clone()
    }

    /// Written only by the config apply pipeline.
    pub fn set_active_config(&self, name: Option<&str>) {
        self.selection.write().config = name.map(str::to_string);
    }

    pub fn selection(&self) -> ActiveSelection {
        self.selection.read().clone()
    }

    pub fn execution_backend(&self) -> ExecutionBackend {
        *self.backend.read()
    }

    pub fn set_execution_backend(&self, backend: ExecutionBackend) {
        *self.backend.write() = backend;
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(ExecutionBackend::default())
    }
}
