use std::sync::atomic::Ordering;

use tracing::{debug, warn};

use super::{ConnectionPool, ResourceHandle};

impl<C> ConnectionPool<C> {
    /// Discard an unhealthy handle, then try to restore capacity.
    ///
    /// The borrower's request has already completed, so a failed replacement
    /// only degrades capacity; it is logged and counted, never returned.
    pub(super) fn discard_and_replace(&self, handle: ResourceHandle<C>) {
        let id = handle.id();
        self.retire(handle);
        self.counters.discarded.fetch_add(1, Ordering::Relaxed);
        warn!(connection_id = id, "Discarded unhealthy connection");

        self.replenish();
    }

    /// Best-effort: open one handle and park it in the idle queue.
    fn replenish(&self) {
        let _grow = self.grow_lock.lock();

        if self.is_closed() {
            return;
        }
        if self.live.load(Ordering::SeqCst) >= self.config.max_connections {
            // Concurrent growth already used the freed slot.
            return;
        }

        let handle = match self.open_handle() {
            Ok(handle) => handle,
            Err(e) => {
                self.counters
                    .replacement_failures
                    .fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Replacement connection failed, pool running below capacity");
                return;
            }
        };
        self.live.fetch_add(1, Ordering::SeqCst);

        let mut idle = self.idle.lock();
        if idle.closed {
            drop(idle);
            self.retire(handle);
            return;
        }
        debug!(connection_id = handle.id(), "Replacement connection ready");
        idle.handles.push_back(handle);
        drop(idle);
        self.available.notify_one();
    }
}
