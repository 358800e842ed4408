// ── Lazily initialized shared resource ──

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::OnceCell;

/// A resource built on first use and shared by every later caller.
///
/// Concurrent first callers share a single in-flight initialization. A
/// failed initialization leaves the slot empty so the next caller
/// retries. [`teardown`](Self::teardown) swaps in a fresh slot; handles
/// already handed out stay valid until dropped.
pub struct LazyResource<T> {
    cell: ArcSwap<OnceCell<Arc<T>>>,
}

impl<T> Default for LazyResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LazyResource<T> {
    pub fn new() -> Self {
        Self {
            cell: ArcSwap::from_pointee(OnceCell::new()),
        }
    }

    /// Return the resource, building it with `init` if absent.
    pub async fn get_or_init<F, Fut, E>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cell = self.cell.load_full();
        cell.get_or_try_init(|| async { init().await.map(Arc::new) })
            .await
            .map(Arc::clone)
    }

    /// The resource if it has already been built.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.load().get().map(Arc::clone)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.load().initialized()
    }

    /// Discard the current resource. Returns it if one was built.
    pub fn teardown(&self) -> Option<Arc<T>> {
        let old = self.cell.swap(Arc::new(OnceCell::new()));
        old.get().map(Arc::clone)
    }
}
