use std::fmt;
use std::ops::{Deref, DerefMut};

use super::{ConnectionPool, ResourceHandle};

/// RAII guard for a borrowed handle.
///
/// Invariants:
/// - A guard is created only after an acquisition succeeded
/// - The handle is released exactly once, on drop, on every exit path
///   including unwinding
pub struct PooledConnection<'a, C> {
    pool: &'a ConnectionPool<C>,
    handle: Option<ResourceHandle<C>>,
}

impl<C> fmt::Debug for PooledConnection<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl<'a, C> PooledConnection<'a, C> {
    pub(super) fn new(pool: &'a ConnectionPool<C>, handle: ResourceHandle<C>) -> Self {
        Self {
            pool,
            handle: Some(handle),
        }
    }

    fn handle(&self) -> &ResourceHandle<C> {
        self.handle
            .as_ref()
            .expect("pooled handle is present until drop")
    }

    fn handle_mut(&mut self) -> &mut ResourceHandle<C> {
        self.handle
            .as_mut()
            .expect("pooled handle is present until drop")
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.handle().id()
    }

    /// Discard this handle instead of reusing it when the guard drops.
    pub fn mark_broken(&mut self) {
        self.handle_mut().mark_broken();
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.handle().is_alive()
    }
}

impl<C> Deref for PooledConnection<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.handle()
    }
}

impl<C> DerefMut for PooledConnection<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.handle_mut()
    }
}

impl<C> Drop for PooledConnection<'_, C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // A panic while the handle was borrowed may have left it mid-transaction.
            let healthy = handle.is_alive() && !std::thread::panicking();
            self.pool.release(handle, healthy);
        }
    }
}
