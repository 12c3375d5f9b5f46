//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Cross-component signaling and lifecycle state (§4.5): shutdown
//! broadcast, the action-processor wake-up signal, the latched
//! `Initialized` readiness flag, and the named-lock acquisition registry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Notify, watch};

/// The two named locks shared with the rest of the profile server.
/// The core always acquires them in this order (§4.5, §5).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Lock {
    Neighbor,
    NeighborhoodAction,
}

/// Process-wide shutdown broadcast. Every suspension point in C1/C3 is
/// parameterized by a clone of the receiver and races it against the
/// blocking operation via `tokio::select!`.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
}

#[derive(Clone, Debug)]
pub struct ShutdownReceiver {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new() -> (ShutdownSignal, ShutdownReceiver) {
        let (tx, rx) = watch::channel(false);
        (
            ShutdownSignal { tx: Arc::new(tx) },
            ShutdownReceiver { rx },
        )
    }

    /// Fires the shutdown signal. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

impl ShutdownReceiver {
    /// Resolves once shutdown has been signaled. Intended for use as one
    /// arm of a `tokio::select!` alongside the operation being cancelled.
    pub async fn recv(&mut self) {
        let _ = self.rx.wait_for(|shutdown| *shutdown).await;
    }

    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Non-blocking wake-up for the external Action Processor (§4.5, §6.2).
/// Multiple pending signals collapse into a single wake-up, which is
/// exactly what [`tokio::sync::Notify`] provides.
#[derive(Clone, Debug, Default)]
pub struct ActionProcessorSignal {
    notify: Arc<Notify>,
}

impl ActionProcessorSignal {
    pub fn new() -> ActionProcessorSignal {
        ActionProcessorSignal::default()
    }

    /// Wakes the processor's worker. Called after a committing
    /// transaction that enqueued at least one action.
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    /// Waits for the next wake-up. Exposed for the Action Processor
    /// itself, which is out of scope but consumes this handle.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

/// Write-once readiness flag: becomes `true` once the initial
/// neighborhood fetch commits, and is never reverted (§4.3, §5, §8).
#[derive(Clone, Debug, Default)]
pub struct Initialized {
    flag: Arc<AtomicBool>,
}

impl Initialized {
    pub fn new() -> Initialized {
        Initialized::default()
    }

    pub fn get(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Latches readiness. Calling this more than once is harmless; it
    /// never clears the flag.
    pub fn set(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

/// Debug-assertion registry detecting out-of-order named-lock
/// acquisition (§9: "Implementations must detect out-of-order
/// acquisition in tests").
///
/// Acquisition must always observe `Neighbor` before
/// `NeighborhoodAction`; this registry panics in debug builds if that
/// order is violated. Release resets the registry for the next
/// transaction.
#[derive(Debug, Default)]
pub struct LockGuardRegistry {
    neighbor_held: AtomicBool,
    neighborhood_action_held: AtomicBool,
}

impl LockGuardRegistry {
    pub fn new() -> LockGuardRegistry {
        LockGuardRegistry::default()
    }

    pub fn acquire(&self, lock: Lock) {
        match lock {
            Lock::Neighbor => {
                self.neighbor_held.store(true, Ordering::SeqCst);
            }
            Lock::NeighborhoodAction => {
                debug_assert!(
                    self.neighbor_held.load(Ordering::SeqCst),
                    "NeighborhoodActionLock acquired before NeighborLock"
                );
                self.neighborhood_action_held.store(true, Ordering::SeqCst);
            }
        }
    }

    pub fn release(&self, lock: Lock) {
        match lock {
            Lock::Neighbor => {
                debug_assert!(
                    !self.neighborhood_action_held.load(Ordering::SeqCst),
                    "NeighborLock released before NeighborhoodActionLock"
                );
                self.neighbor_held.store(false, Ordering::SeqCst);
            }
            Lock::NeighborhoodAction => {
                self.neighborhood_action_held.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Acquires both locks in the fixed order required by the core.
    pub fn acquire_pair(&self) {
        self.acquire(Lock::Neighbor);
        self.acquire(Lock::NeighborhoodAction);
    }

    /// Releases both locks, in reverse acquisition order.
    pub fn release_pair(&self) {
        self.release(Lock::NeighborhoodAction);
        self.release(Lock::Neighbor);
    }
}
