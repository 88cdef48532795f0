//! Integration tests for the directory watcher and its rebuild driver.
//!
//! The driver is exercised with synthetic channel notices so the tests
//! are deterministic; one test goes through the real filesystem watcher.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use hotswap_core::events::{EventBus, RuntimeEvent};
use hotswap_core::inventory::{ArtifactKind, Inventory};
use hotswap_core::quit::QuitSignal;
use hotswap_core::settings::SettingsStore;
use hotswap_core::watcher::{spawn_rebuild_driver, ChangeNotice, DirectoryWatcher, WatchError};

const DEBOUNCE: Duration = Duration::from_millis(50);

fn inventory_over(dir: &TempDir, events: EventBus) -> Arc<Inventory> {
    Arc::new(Inventory::new(
        ArtifactKind::Model,
        dir.path().to_path_buf(),
        "onnx",
        Arc::new(SettingsStore::default()),
        events,
    ))
}

/// Wait until `predicate` holds or the deadline passes.
async fn wait_for(mut predicate: impl FnMut() -> bool, deadline: Duration) -> bool {
    let step = Duration::from_millis(25);
    let mut waited = Duration::ZERO;
    while waited < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(step).await;
        waited += step;
    }
    predicate()
}

#[tokio::test]
async fn watching_a_missing_directory_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent");
    let result = DirectoryWatcher::watch(&missing, "onnx");
    assert!(matches!(result, Err(WatchError::DirectoryMissing(_))));
}

#[tokio::test]
async fn driver_rebuilds_once_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.onnx"), b"x").unwrap();

    let events = EventBus::new(32);
    let inventory = inventory_over(&dir, events.clone());
    let (_tx, rx) = mpsc::channel(8);

    spawn_rebuild_driver(
        DirectoryWatcher::from_channel(rx),
        inventory.clone(),
        QuitSignal::new(),
        DEBOUNCE,
    );

    assert!(wait_for(|| inventory.contains("a.onnx"), Duration::from_secs(2)).await);
}

#[tokio::test]
async fn synthetic_notices_drive_rebuilds() {
    let dir = tempfile::tempdir().unwrap();
    let events = EventBus::new(32);
    let inventory = inventory_over(&dir, events.clone());
    let (tx, rx) = mpsc::channel(8);

    spawn_rebuild_driver(
        DirectoryWatcher::from_channel(rx),
        inventory.clone(),
        QuitSignal::new(),
        DEBOUNCE,
    );
    assert!(wait_for(|| inventory.is_empty(), Duration::from_secs(1)).await);

    std::fs::write(dir.path().join("a.onnx"), b"x").unwrap();
    tx.send(ChangeNotice).await.unwrap();

    assert!(wait_for(|| inventory.contains("a.onnx"), Duration::from_secs(2)).await);
}

#[tokio::test]
async fn notice_bursts_coalesce_into_one_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let events = EventBus::new(32);
    let inventory = inventory_over(&dir, events.clone());
    let (tx, rx) = mpsc::channel(8);

    let mut rx_events = events.subscribe();
    spawn_rebuild_driver(
        DirectoryWatcher::from_channel(rx),
        inventory.clone(),
        QuitSignal::new(),
        DEBOUNCE,
    );

    // Initial rebuild.
    assert_eq!(
        rx_events.recv().await.unwrap(),
        RuntimeEvent::InventoryChanged {
            kind: ArtifactKind::Model
        }
    );

    // A burst of four notices inside the quiet window.
    for _ in 0..4 {
        tx.send(ChangeNotice).await.unwrap();
    }

    // Exactly one more rebuild notification follows.
    assert_eq!(
        rx_events.recv().await.unwrap(),
        RuntimeEvent::InventoryChanged {
            kind: ArtifactKind::Model
        }
    );
    assert!(matches!(
        tokio::time::timeout(DEBOUNCE * 4, rx_events.recv()).await,
        Err(_)
    ));
}

#[tokio::test]
async fn quitting_flag_suppresses_rebuild_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let events = EventBus::new(32);
    let inventory = inventory_over(&dir, events.clone());
    let (tx, rx) = mpsc::channel(8);
    let quit = QuitSignal::new();

    let handle = spawn_rebuild_driver(
        DirectoryWatcher::from_channel(rx),
        inventory.clone(),
        quit.clone(),
        DEBOUNCE,
    );
    assert!(wait_for(|| inventory.is_empty(), Duration::from_secs(1)).await);

    quit.begin();
    std::fs::write(dir.path().join("late.onnx"), b"x").unwrap();
    let _ = tx.send(ChangeNotice).await;

    // The notice is received but dropped; no rebuild runs and the driver
    // winds down.
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("driver exits after quit")
        .unwrap();
    assert!(!inventory.contains("late.onnx"));
}

#[tokio::test]
async fn real_filesystem_events_reach_the_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let events = EventBus::new(32);
    let inventory = inventory_over(&dir, events.clone());

    let watcher = DirectoryWatcher::watch(dir.path(), "onnx").unwrap();
    spawn_rebuild_driver(watcher, inventory.clone(), QuitSignal::new(), DEBOUNCE);

    // Give the initial rebuild a moment, then create a matching file.
    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(dir.path().join("dropped.onnx"), b"weights").unwrap();

    assert!(
        wait_for(|| inventory.contains("dropped.onnx"), Duration::from_secs(5)).await,
        "filesystem event should trigger a rebuild"
    );

    // Non-matching files never surface.
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!inventory.contains("notes.txt"));
}
