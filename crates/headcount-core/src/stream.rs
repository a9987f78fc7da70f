// ── Reactive snapshot stream ──
//
// Subscription type for consuming occupancy changes from the engine.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::OccupancySnapshot;

/// A subscription to the engine's published occupancy.
///
/// Offers point-in-time access, `changed()` notification, or conversion
/// into a `Stream`.
pub struct SnapshotStream {
    current: Arc<OccupancySnapshot>,
    receiver: watch::Receiver<Arc<OccupancySnapshot>>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<OccupancySnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> &Arc<OccupancySnapshot> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Arc<OccupancySnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next publication.
    /// Returns `None` once the engine has stopped.
    pub async fn changed(&mut self) -> Option<Arc<OccupancySnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The first item is the snapshot current at conversion time.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by the engine's `watch` channel.
pub struct SnapshotWatchStream {
    inner: WatchStream<Arc<OccupancySnapshot>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<OccupancySnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
