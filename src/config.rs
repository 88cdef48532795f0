//! Runtime configuration loading from environment variables.
//!
//! All values are loaded from `HOTSWAP_*` environment variables with
//! sensible defaults. Invalid values fall back to defaults without
//! crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `HOTSWAP_MODEL_DIR` | bin/models | Watched model artifact directory |
//! | `HOTSWAP_CONFIG_DIR` | bin/configs | Watched config artifact directory |
//! | `HOTSWAP_MODEL_EXT` | onnx | Model artifact extension |
//! | `HOTSWAP_CONFIG_EXT` | cfg | Config artifact extension |
//! | `HOTSWAP_BACKEND` | cpu | Execution backend (cpu/cuda/tensorrt) |
//! | `HOTSWAP_DEBOUNCE_MS` | 200 | Watcher burst-coalescing window |
//! | `HOTSWAP_GRACE_DELAY_MS` | 150 | Pre-swap quiesce delay |
//! | `HOTSWAP_COMPILE_POLL_MS` | 50 | Compile-wait poll interval |
//! | `HOTSWAP_COMPILE_TIMEOUT_MS` | 30000 | Compile-wait upper bound |
//! | `HOTSWAP_STATUS_TTL_MS` | 2000 | Status text display duration |
//! | `HOTSWAP_EVENT_CAPACITY` | 64 | Broadcast channel capacity |

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::ExecutionBackend;
use crate::swap::SwapConfig;
use crate::RuntimeConfig;

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Read a string env var with a default for missing or empty values.
fn parse_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) if !val.is_empty() => val,
        _ => default.to_string(),
    }
}

fn load_swap_config() -> SwapConfig {
    let grace = parse_u64("HOTSWAP_GRACE_DELAY_MS", 150);
    let poll = parse_u64("HOTSWAP_COMPILE_POLL_MS", 50);
    let timeout = parse_u64("HOTSWAP_COMPILE_TIMEOUT_MS", 30_000);
    let poll = poll.max(10); // floor: 10ms
    let timeout = timeout.max(poll); // bound >= one poll interval
    SwapConfig {
        grace_delay: Duration::from_millis(grace),
        compile_poll_interval: Duration::from_millis(poll),
        compile_timeout: Duration::from_millis(timeout),
    }
}

/// Load all runtime configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> RuntimeConfig {
    let backend = parse_string("HOTSWAP_BACKEND", "cpu")
        .parse::<ExecutionBackend>()
        .unwrap_or_default();
    let debounce = parse_u64("HOTSWAP_DEBOUNCE_MS", 200).max(10);
    let status_ttl = parse_u64("HOTSWAP_STATUS_TTL_MS", 2000).max(100);
    let event_capacity = parse_usize("HOTSWAP_EVENT_CAPACITY", 64).max(8);

    RuntimeConfig {
        model_dir: PathBuf::from(parse_string("HOTSWAP_MODEL_DIR", "bin/models")),
        config_dir: PathBuf::from(parse_string("HOTSWAP_CONFIG_DIR", "bin/configs")),
        model_extension: parse_string("HOTSWAP_MODEL_EXT", "onnx"),
        config_extension: parse_string("HOTSWAP_CONFIG_EXT", "cfg"),
        backend,
        debounce: Duration::from_millis(debounce),
        status_ttl: Duration::from_millis(status_ttl),
        event_capacity,
        swap: load_swap_config(),
    }
}
