//! Background sweep of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::store::TtlCache;

/// Owns the periodic sweep task; dropping the handle does not stop it, call
/// [`shutdown`](Self::shutdown).
pub struct CacheSweeper {
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    /// Spawn a task that sweeps `cache` every `interval`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<V>(cache: Arc<TtlCache<V>>, interval: Duration) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let removed = cache.sweep();
                if removed > 0 {
                    debug!(
                        target = "folio::cache::sweeper",
                        removed,
                        remaining = cache.len(),
                        "Swept expired cache entries"
                    );
                }
            }
        });

        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the sweep task and wait for it to unwind.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}
