//! One-way runtime notifications.
//!
//! Components publish fire-and-forget events; observers (a UI, a test
//! harness) subscribe through a broadcast channel. No acknowledgment is
//! expected, and publishing with no observer attached is not an error.

use tokio::sync::broadcast;

use crate::inventory::ArtifactKind;

/// Outcome carried by an active-model notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed { reason: String },
}

/// Notifications produced by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The listing for one artifact directory was rebuilt.
    InventoryChanged { kind: ArtifactKind },
    /// A model swap finished (or a rebuild re-confirmed the active model).
    ActiveModelChanged { name: String, outcome: LoadOutcome },
    /// A configuration was applied (or a rebuild re-reported the last one).
    ActiveConfigChanged { name: String },
}

/// Cloneable publish handle over a broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RuntimeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Lagging or absent observers are not an error.
    pub fn emit(&self, event: RuntimeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.tx.subscribe()
    }
}
