//! Process-wide quitting flag.
//!
//! Once shutdown begins, watcher notices are still received but must be
//! dropped before any rebuild side effect runs. This wraps a cancellation
//! token so tasks can both poll the flag and await it.

use tokio_util::sync::CancellationToken;

/// Cloneable handle to the process-wide quit flag.
#[derive(Debug, Clone)]
pub struct QuitSignal {
    token: CancellationToken,
}

impl QuitSignal {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Set the flag. Idempotent; all clones observe it.
    pub fn begin(&self) {
        self.token.cancel();
    }

    /// True once shutdown has begun.
    pub fn is_quitting(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when shutdown begins. Never resolves otherwise.
    pub async fn quitting(&self) {
        self.token.cancelled().await;
    }
}

impl Default for QuitSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_starts_clear_and_sets_once() {
        let quit = QuitSignal::new();
        assert!(!quit.is_quitting());

        let clone = quit.clone();
        quit.begin();
        assert!(quit.is_quitting());
        assert!(clone.is_quitting(), "clones share the flag");

        // Idempotent
        quit.begin();
        assert!(quit.is_quitting());
    }

    #[tokio::test]
    async fn quitting_future_resolves_after_begin() {
        let quit = QuitSignal::new();
        let waiter = quit.clone();
        let handle = tokio::spawn(async move { waiter.quitting().await });
        quit.begin();
        handle.await.unwrap();
    }
}
