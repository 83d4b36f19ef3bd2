use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

/// One live backend connection, owned by exactly one party at a time.
///
/// Dereferences to the wrapped connection. Dropping the handle closes it.
pub struct ResourceHandle<C> {
    id: u64,
    created_at: Instant,
    alive: bool,
    conn: C,
}

impl<C> ResourceHandle<C> {
    pub(super) fn new(id: u64, conn: C) -> Self {
        Self {
            id,
            created_at: Instant::now(),
            alive: true,
            conn,
        }
    }

    /// Pool-unique identity, for diagnostics.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    #[must_use]
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Flag the connection as unusable; the pool discards it on release.
    pub fn mark_broken(&mut self) {
        self.alive = false;
    }
}

impl<C> Deref for ResourceHandle<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.conn
    }
}

impl<C> DerefMut for ResourceHandle<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.conn
    }
}

impl<C> fmt::Debug for ResourceHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("id", &self.id)
            .field("alive", &self.alive)
            .field("age", &self.age())
            .finish_non_exhaustive()
    }
}
