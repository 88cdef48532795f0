//! Config apply pipeline.
//!
//! Reads a configuration artifact, decodes it fully, and propagates the
//! decoded values to the shared settings store. Applies are serialized;
//! a decode failure aborts before any value reaches the store, so prior
//! settings stay intact. Configs are safe to hot-apply, so no toggle
//! suspension is involved.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use metrics::counter;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::events::{EventBus, RuntimeEvent};
use crate::settings::SettingsStore;
use crate::status::StatusBoard;

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Config artifact unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Applies configuration artifacts to the settings store.
pub struct ConfigApplier {
    settings: Arc<SettingsStore>,
    events: EventBus,
    status: StatusBoard,
    // Serializes concurrent applies; the second caller waits rather than
    // interleaving partial writes.
    gate: Mutex<()>,
}

impl ConfigApplier {
    pub fn new(settings: Arc<SettingsStore>, events: EventBus, status: StatusBoard) -> Self {
        Self {
            settings,
            events,
            status,
            gate: Mutex::new(()),
        }
    }

    /// Read, decode, and propagate one configuration artifact.
    ///
    /// The artifact is a JSON object of setting name → value. Decoding
    /// happens entirely into a staging map before the store is touched;
    /// the commit itself is a single write section.
    pub async fn apply(&self, path: &Path) -> Result<(), ApplyError> {
        let _gate = self.gate.lock().await;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let raw = tokio::fs::read_to_string(path).await?;
        let staged: HashMap<String, Value> = match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(error) => {
                counter!("hotswap_config_failure_total").increment(1);
                warn!(config = %name, %error, "config decode failed");
                self.status.post(format!("Config load failed: {error}"));
                return Err(ApplyError::Decode(error));
            }
        };

        self.settings.commit_values(staged);
        self.settings.set_active_config(Some(&name));

        counter!("hotswap_config_success_total").increment(1);
        info!(config = %name, "config applied");
        self.status.post(format!("Loaded config: {name}"));
        self.events
            .emit(RuntimeEvent::ActiveConfigChanged { name });

        Ok(())
    }
}
