//! Transient user-visible status text.
//!
//! Swap and apply report their phase ("loading …", "loaded …", error text)
//! through a status line that auto-clears after a fixed display duration.
//! A generation counter keeps an older clear timer from wiping a newer
//! message.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Inner {
    text: Mutex<Option<String>>,
    generation: AtomicU64,
}

/// Cloneable status line with auto-clearing posts.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    inner: Arc<Inner>,
    ttl: Duration,
}

impl StatusBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            ttl,
        }
    }

    /// Show `text`, clearing it after the display duration unless a newer
    /// post replaced it first. Must be called from a tokio runtime.
    pub fn post(&self, text: impl Into<String>) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.text.lock() = Some(text.into());

        let inner = self.inner.clone();
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if inner.generation.load(Ordering::SeqCst) == generation {
                *inner.text.lock() = None;
            }
        });
    }

    /// Currently displayed text, if any.
    pub fn current(&self) -> Option<String> {
        self.inner.text.lock().clone()
    }
}
