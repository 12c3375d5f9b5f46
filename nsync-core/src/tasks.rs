//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Spawns and owns the core's single long-lived task (§5): the LBN
//! session engine.

use nsync_utils::task::Task;

use crate::config::Config;
use crate::repository::Repository;
use crate::session::Session;
use crate::signal::{ActionProcessorSignal, Initialized, ShutdownReceiver};

/// Handle to the running session task.
///
/// Dropping it aborts the session, per [`Task`]'s default semantics; call
/// [`CoreHandle::detach`] to let it run independently of this handle.
pub struct CoreHandle {
    task: Task<()>,
}

impl CoreHandle {
    /// Spawns the session engine as the core's single long-lived task.
    pub fn spawn<R>(
        config: Config,
        repo: R,
        action_signal: ActionProcessorSignal,
        initialized: Initialized,
        shutdown: ShutdownReceiver,
    ) -> CoreHandle
    where
        R: Repository + Send + Sync + 'static,
    {
        let session =
            Session::new(config, repo, action_signal, initialized, shutdown);
        CoreHandle {
            task: Task::spawn(session.run()),
        }
    }

    /// Lets the session keep running independently of this handle's
    /// lifetime.
    pub fn detach(mut self) {
        self.task.detach();
    }
}
