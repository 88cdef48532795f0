//! The model swap state machine.
//!
//! Serializes swap requests behind a single state slot, suspends dependent
//! toggles for the duration of an attempt, replaces the engine instance
//! with construct-swap-release ordering, and waits out backend compilation
//! when the execution backend requires it. All shared-state mutation is
//! performed by the requesting task under the slot's exclusion, so two
//! attempts can never interleave.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::toggles::{ToggleGuard, DEPENDENT_TOGGLES};
use crate::engine::{EngineError, EngineFactory, InferenceEngine};
use crate::events::{EventBus, LoadOutcome, RuntimeEvent};
use crate::inventory::Inventory;
use crate::settings::SettingsStore;
use crate::status::StatusBoard;

#[derive(Error, Debug)]
pub enum SwapError {
    /// A swap is already in progress; the request is ignored with no
    /// state change. The caller should ask the user to wait.
    #[error("Model swap already in progress")]
    SwapInProgress,

    #[error("Model not listed in inventory: {0}")]
    UnknownModel(String),

    #[error("Engine construction failed: {0}")]
    Construction(#[from] EngineError),

    #[error("Backend compilation did not finish within {0:?}")]
    CompilationTimeout(Duration),
}

/// How an accepted request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The target is now the active model.
    Swapped,
    /// The target was already active; nothing was suspended, disposed, or
    /// reconstructed.
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwapState {
    Idle,
    Preparing,
    Loading,
}

/// Timing knobs for a swap attempt.
#[derive(Debug, Clone)]
pub struct SwapConfig {
    /// Best-effort quiesce before the engine is touched, giving in-flight
    /// dependents time to observe the suspended toggles.
    pub grace_delay: Duration,
    /// Interval between `is_still_compiling` polls.
    pub compile_poll_interval: Duration,
    /// Upper bound on the compile wait; exceeding it fails the swap.
    pub compile_timeout: Duration,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            grace_delay: Duration::from_millis(150),
            compile_poll_interval: Duration::from_millis(50),
            compile_timeout: Duration::from_secs(30),
        }
    }
}

/// Owns the engine slot and the swap state machine.
pub struct SwapCoordinator {
    state: RwLock<SwapState>,
    engine: Mutex<Option<Box<dyn InferenceEngine>>>,
    factory: Arc<dyn EngineFactory>,
    inventory: Arc<Inventory>,
    settings: Arc<SettingsStore>,
    events: EventBus,
    status: StatusBoard,
    config: SwapConfig,
}

impl SwapCoordinator {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        inventory: Arc<Inventory>,
        settings: Arc<SettingsStore>,
        events: EventBus,
        status: StatusBoard,
        config: SwapConfig,
    ) -> Self {
        Self {
            state: RwLock::new(SwapState::Idle),
            engine: Mutex::new(None),
            factory,
            inventory,
            settings,
            events,
            status,
            config,
        }
    }

    /// Request that `target` become the active model.
    ///
    /// Requesting the currently active model is an idempotent no-op. A
    /// request arriving while another swap is in progress is rejected, not
    /// queued. Otherwise the attempt runs to [`SwapOutcome::Swapped`] or
    /// an error; there is no mid-load cancellation.
    pub async fn request_swap(&self, target: &str) -> Result<SwapOutcome, SwapError> {
        if self.settings.active_model().as_deref() == Some(target) {
            return Ok(SwapOutcome::AlreadyActive);
        }

        // Acquire the swap slot. Checked and set under one write lock so
        // user selections and programmatic triggers cannot both enter.
        {
            let mut state = self.state.write().await;
            if *state != SwapState::Idle {
                counter!("hotswap_swap_rejected_total").increment(1);
                return Err(SwapError::SwapInProgress);
            }
            *state = SwapState::Preparing;
        }

        self.status.post(format!("Loading model: {target}"));
        let result = self.run_attempt(target).await;
        *self.state.write().await = SwapState::Idle;

        match &result {
            Ok(SwapOutcome::Swapped) => {
                counter!("hotswap_swap_success_total").increment(1);
                info!(model = %target, "model swap complete");
                self.status.post(format!("Loaded model: {target}"));
                self.events.emit(RuntimeEvent::ActiveModelChanged {
                    name: target.to_string(),
                    outcome: LoadOutcome::Loaded,
                });
            }
            Ok(SwapOutcome::AlreadyActive) => {}
            Err(error) => {
                counter!("hotswap_swap_failure_total").increment(1);
                warn!(model = %target, %error, "model swap failed");
                self.status.post(format!("Model load failed: {error}"));
                self.events.emit(RuntimeEvent::ActiveModelChanged {
                    name: target.to_string(),
                    outcome: LoadOutcome::Failed {
                        reason: error.to_string(),
                    },
                });
            }
        }

        result
    }

    /// The Preparing → Loading → (Active | Failed) sequence. Runs with
    /// the swap slot held.
    async fn run_attempt(&self, target: &str) -> Result<SwapOutcome, SwapError> {
        if !self.inventory.contains(target) {
            return Err(SwapError::UnknownModel(target.to_string()));
        }
        self.inventory.set_loading(target);

        let result = self.replace_engine(target).await;

        self.inventory.clear_loading();
        match result {
            Ok(()) => {
                self.settings.set_active_model(Some(target));
                Ok(SwapOutcome::Swapped)
            }
            Err(error) => {
                // A failed load must not leave the system claiming any
                // model is active. Release whatever the slot holds so the
                // slot and the selection agree, and retries stay possible.
                drop(self.engine.lock().take());
                self.settings.set_active_model(None);
                Err(error)
            }
        }
    }

    async fn replace_engine(&self, target: &str) -> Result<(), SwapError> {
        // Restored exactly once when the guard drops, on every exit path
        // out of this function: success, error return, or unwind.
        let _restore = ToggleGuard::suspend(&self.settings, DEPENDENT_TOGGLES);

        tokio::time::sleep(self.config.grace_delay).await;
        *self.state.write().await = SwapState::Loading;

        let path = self.inventory.artifact_path(target);
        let new_engine = self.factory.construct(&path).await?;

        // Swap the owning slot, then release the previous instance. The
        // selection keeps pointing at the old name until the attempt
        // succeeds.
        let previous = self.engine.lock().replace(new_engine);
        drop(previous);

        if self.settings.execution_backend().requires_compile_wait() {
            self.wait_for_compilation().await?;
        }
        Ok(())
    }

    /// Poll the engine's compilation flag until it clears, bounded by the
    /// configured timeout.
    async fn wait_for_compilation(&self) -> Result<(), SwapError> {
        let deadline = tokio::time::Instant::now() + self.config.compile_timeout;

        loop {
            let compiling = self
                .engine
                .lock()
                .as_ref()
                .map(|e| e.is_still_compiling())
                .unwrap_or(false);
            if !compiling {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(SwapError::CompilationTimeout(self.config.compile_timeout));
            }
            tokio::time::sleep(self.config.compile_poll_interval).await;
        }
    }

    /// True when no swap is in progress; a selection surface can mirror
    /// this to enable or disable itself.
    pub async fn is_idle(&self) -> bool {
        *self.state.read().await == SwapState::Idle
    }

    /// True while the engine slot holds a live instance.
    pub fn has_engine(&self) -> bool {
        self.engine.lock().is_some()
    }
}
