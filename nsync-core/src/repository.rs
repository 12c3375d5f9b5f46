//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The abstract repository and unit-of-work contracts the reconciler
//! mutates persistent state through (§6.2). The real ORM-backed
//! implementation lives outside this core; only the interface and a
//! fake, in-memory implementation for tests live here.

use crate::model::{Neighbor, NeighborhoodAction};
use crate::signal::{Lock, LockGuardRegistry};

/// Read/write access to the `Neighbor` table.
pub trait NeighborRepository {
    /// Number of neighbors currently tracked.
    async fn count(&self) -> usize;

    async fn find_by_id(&self, neighbor_id: &[u8]) -> Option<Neighbor>;

    async fn insert(&self, neighbor: Neighbor);

    async fn update(&self, neighbor: Neighbor);
}

/// Write access to the `NeighborhoodAction` queue.
pub trait NeighborhoodActionRepository {
    async fn insert(&self, action: NeighborhoodAction);
}

/// Transactional boundary mediating access to both repositories, with
/// the named-lock discipline from §4.5/§5/§9 built in.
pub trait UnitOfWork {
    /// Begins a transaction holding the given locks, acquired in the
    /// order provided by the caller. The core always calls this with
    /// `[Lock::Neighbor, Lock::NeighborhoodAction]`.
    async fn begin_transaction_with_lock(&self, locks: &[Lock]);

    /// Flushes pending writes without ending the transaction. This is
    /// one of the two points (along with [`commit`](Self::commit)) where
    /// a persistence exception can surface (§7).
    async fn save(&self) -> Result<(), crate::error::Error>;

    /// Commits the transaction and releases its locks.
    async fn commit(&self) -> Result<(), crate::error::Error>;

    /// Rolls back the transaction and releases its locks.
    async fn rollback(&self);
}

/// Everything the reconciler needs from a collaborator.
pub trait Repository:
    NeighborRepository + NeighborhoodActionRepository + UnitOfWork
{
}

impl<T> Repository for T where
    T: NeighborRepository + NeighborhoodActionRepository + UnitOfWork
{
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// In-memory stand-in for the real ORM-backed repository, used to
    /// test the reconciler without a database. Lock acquisition and
    /// release go through the same [`LockGuardRegistry`] the real
    /// implementation would use, so out-of-order acquisition is caught
    /// here too.
    #[derive(Default)]
    pub struct MemoryRepository {
        neighbors: Mutex<Vec<Neighbor>>,
        actions: Mutex<Vec<NeighborhoodAction>>,
        lock_registry: LockGuardRegistry,
        // Snapshot taken at `begin_transaction_with_lock`, restored on
        // `rollback` so a failed batch leaves the tables unchanged (§8
        // invariant 4).
        snapshot: Mutex<Option<(Vec<Neighbor>, Vec<NeighborhoodAction>)>>,
        fail_next_save: AtomicBool,
    }

    impl MemoryRepository {
        pub fn new() -> MemoryRepository {
            MemoryRepository::default()
        }

        pub fn neighbors(&self) -> Vec<Neighbor> {
            self.neighbors.lock().unwrap().clone()
        }

        pub fn actions(&self) -> Vec<NeighborhoodAction> {
            self.actions.lock().unwrap().clone()
        }

        /// Makes the next `save()` call fail with `Error::Persistence`,
        /// exercising the rollback/`ErrorInternal` path (§7 "Persistence",
        /// §8 invariant 4). Resets itself once triggered.
        pub fn fail_next_save(&self) {
            self.fail_next_save.store(true, Ordering::SeqCst);
        }
    }

    impl NeighborRepository for MemoryRepository {
        async fn count(&self) -> usize {
            self.neighbors.lock().unwrap().len()
        }

        async fn find_by_id(&self, neighbor_id: &[u8]) -> Option<Neighbor> {
            self.neighbors
                .lock()
                .unwrap()
                .iter()
                .find(|n| n.neighbor_id == neighbor_id)
                .cloned()
        }

        async fn insert(&self, neighbor: Neighbor) {
            self.neighbors.lock().unwrap().push(neighbor);
        }

        async fn update(&self, neighbor: Neighbor) {
            let mut neighbors = self.neighbors.lock().unwrap();
            if let Some(existing) = neighbors
                .iter_mut()
                .find(|n| n.neighbor_id == neighbor.neighbor_id)
            {
                *existing = neighbor;
            }
        }
    }

    impl NeighborhoodActionRepository for MemoryRepository {
        async fn insert(&self, action: NeighborhoodAction) {
            self.actions.lock().unwrap().push(action);
        }
    }

    impl UnitOfWork for MemoryRepository {
        async fn begin_transaction_with_lock(&self, locks: &[Lock]) {
            for lock in locks {
                self.lock_registry.acquire(*lock);
            }
            let snapshot = (
                self.neighbors.lock().unwrap().clone(),
                self.actions.lock().unwrap().clone(),
            );
            *self.snapshot.lock().unwrap() = Some(snapshot);
        }

        async fn save(&self) -> Result<(), crate::error::Error> {
            if self.fail_next_save.swap(false, Ordering::SeqCst) {
                return Err(crate::error::Error::Persistence(
                    "induced test failure".to_string(),
                ));
            }
            Ok(())
        }

        async fn commit(&self) -> Result<(), crate::error::Error> {
            self.snapshot.lock().unwrap().take();
            self.lock_registry.release(Lock::NeighborhoodAction);
            self.lock_registry.release(Lock::Neighbor);
            Ok(())
        }

        async fn rollback(&self) {
            if let Some((neighbors, actions)) =
                self.snapshot.lock().unwrap().take()
            {
                *self.neighbors.lock().unwrap() = neighbors;
                *self.actions.lock().unwrap() = actions;
            }
            self.lock_registry.release(Lock::NeighborhoodAction);
            self.lock_registry.release(Lock::Neighbor);
        }
    }
}
