//! Trailing-edge debouncing for search-as-you-type.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

/// Runs only the last action scheduled within a quiescence window.
///
/// Each `schedule` call supersedes the pending action and restarts the
/// window. An action that has already started is not interrupted. Dropping
/// the debouncer cancels whatever is still pending.
///
/// Actions run on the runtime captured at construction (or given with
/// [`Debouncer::with_handle`]), so `schedule` may be called from threads
/// outside any runtime, such as a UI thread.
pub struct Debouncer {
    window: Duration,
    runtime: Option<Handle>,
    root: CancellationToken,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            runtime: Handle::try_current().ok(),
            root: CancellationToken::new(),
            pending: Mutex::new(None),
        }
    }

    /// Spawn actions on `handle`.
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run `action` once `window` elapses without another call.
    pub fn schedule<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            tracing::warn!("No Tokio runtime available, debounced action dropped");
            return;
        };

        let token = self.root.child_token();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        let window = self.window;
        runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::trace!("Debounced action superseded");
                }
                _ = tokio::time::sleep(window) => {
                    action().await;
                }
            }
        });
    }

    /// Drop the pending action, if any.
    pub fn cancel(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

// =============================================================================
// Tests
// =============================================================================
