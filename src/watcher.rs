//! Artifact directory watcher.
//!
//! The OS watcher pushes unit change notices into a bounded channel; a
//! single driver task per directory consumes them, coalesces bursts, and
//! drives inventory rebuilds. Notices carry no payload; consumers re-list
//! the directory rather than diffing events.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::inventory::Inventory;
use crate::quit::QuitSignal;

/// Capacity of the notice channel. Bursts beyond this are dropped; the
/// next surviving notice triggers a full rebuild anyway.
const NOTICE_CHANNEL_CAPACITY: usize = 64;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watched directory missing: {}", .0.display())]
    DirectoryMissing(PathBuf),

    #[error("File watcher setup failed: {0}")]
    Backend(#[from] notify::Error),
}

/// "Something changed". Carries no payload by contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeNotice;

/// A lazy, infinite, non-restartable sequence of change notices for one
/// directory. Dropping the watcher ends the sequence.
pub struct DirectoryWatcher {
    _watcher: Option<RecommendedWatcher>,
    rx: mpsc::Receiver<ChangeNotice>,
}

impl DirectoryWatcher {
    /// Watch `dir` for changes to files carrying `extension` (without the
    /// leading dot). The directory must already exist; a missing directory
    /// is fatal to this watcher only, never to the process.
    pub fn watch(dir: &Path, extension: &str) -> Result<Self, WatchError> {
        if !dir.is_dir() {
            return Err(WatchError::DirectoryMissing(dir.to_path_buf()));
        }

        let (tx, rx) = mpsc::channel(NOTICE_CHANNEL_CAPACITY);
        let wanted = extension.to_string();

        let mut watcher = recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if !is_relevant(&event, &wanted) {
                        return;
                    }
                    // Full channel means a rebuild is already pending.
                    let _ = tx.try_send(ChangeNotice);
                }
                Err(error) => warn!(%error, "file watcher error"),
            }
        })?;
        watcher.watch(dir, notify::RecursiveMode::NonRecursive)?;

        info!(dir = %dir.display(), extension = %extension, "watching artifact directory");

        Ok(Self {
            _watcher: Some(watcher),
            rx,
        })
    }

    /// A watcher fed from a plain channel instead of the filesystem.
    /// Lets tests inject synthetic notices deterministically.
    pub fn from_channel(rx: mpsc::Receiver<ChangeNotice>) -> Self {
        Self { _watcher: None, rx }
    }

    /// Next notice, or None once the sequence has ended.
    pub async fn next(&mut self) -> Option<ChangeNotice> {
        self.rx.recv().await
    }
}

/// Created/modified/deleted/renamed events for a matching file. Access
/// events never mean the listing changed.
fn is_relevant(event: &Event, extension: &str) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
}

/// Spawn the dedicated task that turns change notices into inventory
/// rebuilds.
///
/// Performs one rebuild up front so the listing is populated before the
/// first event, then coalesces each burst of notices inside a `debounce`
/// quiet window. Once the quitting flag is set, notices are still received
/// but are dropped before any rebuild side effect runs.
pub fn spawn_rebuild_driver(
    mut watcher: DirectoryWatcher,
    inventory: Arc<Inventory>,
    quit: QuitSignal,
    debounce: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        rebuild_logged(&inventory);

        loop {
            let notice = tokio::select! {
                notice = watcher.next() => notice,
                _ = quit.quitting() => break,
            };
            if notice.is_none() {
                break;
            }

            // Renames and copies arrive as several events back to back;
            // wait for a quiet window before re-listing.
            loop {
                match tokio::time::timeout(debounce, watcher.next()).await {
                    Ok(Some(_)) => continue,
                    Ok(None) | Err(_) => break,
                }
            }

            if quit.is_quitting() {
                continue;
            }
            rebuild_logged(&inventory);
        }
    })
}

fn rebuild_logged(inventory: &Inventory) {
    if let Err(error) = inventory.rebuild() {
        warn!(
            %error,
            dir = %inventory.dir().display(),
            "inventory rebuild failed"
        );
    }
}
