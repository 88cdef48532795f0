//! End-to-end tests for the assembled runtime.

use std::sync::Arc;
use std::time::Duration;

use tokio_test::assert_ok;

use hotswap_core::engine::MmapEngineFactory;
use hotswap_core::swap::{SwapConfig, SwapOutcome};
use hotswap_core::{Runtime, RuntimeConfig};

fn fast_config(root: &std::path::Path) -> RuntimeConfig {
    RuntimeConfig {
        model_dir: root.join("bin/models"),
        config_dir: root.join("bin/configs"),
        debounce: Duration::from_millis(50),
        swap: SwapConfig {
            grace_delay: Duration::from_millis(10),
            ..SwapConfig::default()
        },
        ..RuntimeConfig::default()
    }
}

#[tokio::test]
async fn startup_creates_missing_directories() {
    let root = tempfile::tempdir().unwrap();
    let config = fast_config(root.path());
    assert!(!config.model_dir.exists());

    let runtime = Runtime::new(config, Arc::new(MmapEngineFactory)).unwrap();
    assert!(runtime.config().model_dir.is_dir());
    assert!(runtime.config().config_dir.is_dir());
}

#[tokio::test]
async fn swap_and_apply_through_the_runtime() {
    let root = tempfile::tempdir().unwrap();
    let runtime = Runtime::new(fast_config(root.path()), Arc::new(MmapEngineFactory)).unwrap();

    std::fs::write(runtime.config().model_dir.join("net.onnx"), b"weights").unwrap();
    std::fs::write(
        runtime.config().config_dir.join("base.cfg"),
        r#"{"sensitivity": 0.7}"#,
    )
    .unwrap();
    runtime.models.rebuild().unwrap();
    runtime.configs.rebuild().unwrap();

    let outcome = assert_ok!(runtime.request_swap("net.onnx").await);
    assert_eq!(outcome, SwapOutcome::Swapped);
    assert_eq!(runtime.settings.active_model().as_deref(), Some("net.onnx"));
    assert!(runtime.coordinator.has_engine());

    assert_ok!(runtime.apply_config("base.cfg").await);
    assert_eq!(
        runtime.settings.active_config().as_deref(),
        Some("base.cfg")
    );
    assert_eq!(
        runtime.settings.value("sensitivity"),
        Some(serde_json::json!(0.7))
    );
}

#[tokio::test]
async fn watchers_populate_the_inventories() {
    let root = tempfile::tempdir().unwrap();
    let runtime = Runtime::new(fast_config(root.path()), Arc::new(MmapEngineFactory)).unwrap();

    std::fs::write(runtime.config().model_dir.join("seed.onnx"), b"x").unwrap();
    let handles = runtime.start_watchers();
    assert_eq!(handles.len(), 2);

    // The drivers rebuild once at startup; the seeded file appears
    // without any filesystem event.
    let mut waited = Duration::ZERO;
    while !runtime.models.contains("seed.onnx") && waited < Duration::from_secs(2) {
        tokio::time::sleep(Duration::from_millis(25)).await;
        waited += Duration::from_millis(25);
    }
    assert!(runtime.models.contains("seed.onnx"));

    runtime.begin_quit();
    for handle in handles {
        let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
    }
}
