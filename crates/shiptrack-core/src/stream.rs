// ── Reactive timeline streams ──

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::TimelineEvent;

/// A subscription to one shipment's merged timeline.
///
/// Offers the snapshot taken at subscription time, the latest snapshot,
/// and change notification via [`changed`](Self::changed) or as a `Stream`.
pub struct TimelineStream {
    current: Arc<Vec<TimelineEvent>>,
    receiver: watch::Receiver<Arc<Vec<TimelineEvent>>>,
}

impl TimelineStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Vec<TimelineEvent>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot as of subscription or the last `changed()`.
    pub fn current(&self) -> &Arc<Vec<TimelineEvent>> {
        &self.current
    }

    pub fn latest(&self) -> Arc<Vec<TimelineEvent>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next republish. `None` once the store has forgotten
    /// the shipment.
    pub async fn changed(&mut self) -> Option<Arc<Vec<TimelineEvent>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    pub fn into_stream(self) -> TimelineWatchStream {
        TimelineWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding every republished timeline, starting with
/// the current one.
pub struct TimelineWatchStream {
    inner: WatchStream<Arc<Vec<TimelineEvent>>>,
}

impl Stream for TimelineWatchStream {
    type Item = Arc<Vec<TimelineEvent>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
