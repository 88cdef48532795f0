//! Model swap coordination.
//!
//! The state machine governing which model is active and how the engine
//! instance is replaced while the rest of the system keeps running.

mod coordinator;
mod toggles;

pub use coordinator::{SwapConfig, SwapCoordinator, SwapError, SwapOutcome};
pub use toggles::{ToggleGuard, DEPENDENT_TOGGLES};
