//! Hot-swap lifecycle manager for inference artifacts.
//!
//! Watches artifact directories, exposes the available models and configs
//! as a selectable inventory, and safely swaps the active model (or
//! applies a configuration) while the inference pipeline it feeds may be
//! mid-operation.
//!
//! # Guarantees
//!
//! - At most one swap sequence is in progress at any instant; concurrent
//!   requests are rejected, not queued.
//! - Dependent toggles are suspended for the swap window and restored
//!   exactly once per attempt, on every exit path.
//! - A failed load leaves no active model and no live engine, so retries
//!   always start clean.
//! - Config applies are serialized and never propagate a partial decode.

pub mod apply;
pub mod config;
pub mod engine;
pub mod events;
pub mod ingest;
pub mod inventory;
pub mod logging;
pub mod quit;
pub mod settings;
pub mod status;
pub mod swap;
pub mod watcher;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::warn;

use apply::{ApplyError, ConfigApplier};
use engine::{EngineFactory, ExecutionBackend};
use events::{EventBus, RuntimeEvent};
use inventory::{ArtifactKind, Inventory};
use quit::QuitSignal;
use settings::SettingsStore;
use status::StatusBoard;
use swap::{SwapConfig, SwapCoordinator, SwapError, SwapOutcome};
use watcher::{spawn_rebuild_driver, DirectoryWatcher};

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub model_dir: PathBuf,
    pub config_dir: PathBuf,
    /// Extensions without the leading dot.
    pub model_extension: String,
    pub config_extension: String,
    pub backend: ExecutionBackend,
    /// Watcher burst-coalescing window.
    pub debounce: Duration,
    /// Status text display duration.
    pub status_ttl: Duration,
    pub event_capacity: usize,
    pub swap: SwapConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("bin/models"),
            config_dir: PathBuf::from("bin/configs"),
            model_extension: "onnx".to_string(),
            config_extension: "cfg".to_string(),
            backend: ExecutionBackend::default(),
            debounce: Duration::from_millis(200),
            status_ttl: Duration::from_millis(2000),
            event_capacity: 64,
            swap: SwapConfig::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    /// A required artifact directory could not be created. Fatal: the
    /// watchers and inventories have nothing to operate on.
    #[error("Failed to create required directory {}: {source}", .dir.display())]
    DirectoryCreate {
        dir: PathBuf,
        source: std::io::Error,
    },
}

/// The assembled lifecycle manager.
pub struct Runtime {
    pub settings: Arc<SettingsStore>,
    pub models: Arc<Inventory>,
    pub configs: Arc<Inventory>,
    pub coordinator: Arc<SwapCoordinator>,
    pub applier: Arc<ConfigApplier>,
    pub status: StatusBoard,
    pub quit: QuitSignal,
    events: EventBus,
    config: RuntimeConfig,
}

impl Runtime {
    /// Assemble the runtime, creating the watched directories if absent.
    /// Directory creation failure is fatal to startup.
    pub fn new(
        config: RuntimeConfig,
        factory: Arc<dyn EngineFactory>,
    ) -> Result<Self, StartupError> {
        for dir in [&config.model_dir, &config.config_dir] {
            std::fs::create_dir_all(dir).map_err(|source| StartupError::DirectoryCreate {
                dir: dir.clone(),
                source,
            })?;
        }

        let events = EventBus::new(config.event_capacity);
        let status = StatusBoard::new(config.status_ttl);
        let settings = Arc::new(SettingsStore::new(config.backend));

        let models = Arc::new(Inventory::new(
            ArtifactKind::Model,
            config.model_dir.clone(),
            config.model_extension.clone(),
            settings.clone(),
            events.clone(),
        ));
        let configs = Arc::new(Inventory::new(
            ArtifactKind::Config,
            config.config_dir.clone(),
            config.config_extension.clone(),
            settings.clone(),
            events.clone(),
        ));

        let coordinator = Arc::new(SwapCoordinator::new(
            factory,
            models.clone(),
            settings.clone(),
            events.clone(),
            status.clone(),
            config.swap.clone(),
        ));
        let applier = Arc::new(ConfigApplier::new(
            settings.clone(),
            events.clone(),
            status.clone(),
        ));

        Ok(Self {
            settings,
            models,
            configs,
            coordinator,
            applier,
            status,
            quit: QuitSignal::new(),
            events,
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Subscribe to runtime notifications.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RuntimeEvent> {
        self.events.subscribe()
    }

    /// Start one watcher-driven rebuild task per artifact directory.
    ///
    /// A directory whose watcher cannot be constructed is logged and
    /// skipped; monitoring of the other directory continues and the
    /// process keeps running.
    pub fn start_watchers(&self) -> Vec<JoinHandle<()>> {
        let plans = [
            (&self.models, &self.config.model_extension),
            (&self.configs, &self.config.config_extension),
        ];

        let mut handles = Vec::new();
        for (inventory, extension) in plans {
            match DirectoryWatcher::watch(inventory.dir(), extension) {
                Ok(watcher) => handles.push(spawn_rebuild_driver(
                    watcher,
                    inventory.clone(),
                    self.quit.clone(),
                    self.config.debounce,
                )),
                Err(error) => warn!(
                    %error,
                    dir = %inventory.dir().display(),
                    "directory watcher unavailable, continuing without it"
                ),
            }
        }
        handles
    }

    /// Request a model swap by inventory name.
    pub async fn request_swap(&self, name: &str) -> Result<SwapOutcome, SwapError> {
        self.coordinator.request_swap(name).await
    }

    /// Apply a configuration artifact by inventory name.
    pub async fn apply_config(&self, name: &str) -> Result<(), ApplyError> {
        self.applier.apply(&self.configs.artifact_path(name)).await
    }

    /// Begin shutdown: suppresses all further inventory rebuilds.
    pub fn begin_quit(&self) {
        self.quit.begin();
    }
}
