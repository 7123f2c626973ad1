//! Mission hooks that own the watcher.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::scheduler::{ReportScheduler, SchedulerHandle, SchedulerState};

/// Which side of the game this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessRole {
    /// Dedicated server; hosts the watcher.
    Server,
    /// Game client; never reports.
    Client,
}

/// Holds at most one watcher for the lifetime of a mission.
#[derive(Debug)]
pub struct Mission {
    role: ProcessRole,
    watcher: Option<SchedulerHandle>,
}

impl Mission {
    /// Mission for a process of `role`.
    pub fn new(role: ProcessRole) -> Self {
        Self {
            role,
            watcher: None,
        }
    }

    /// Role this mission runs under.
    pub fn role(&self) -> ProcessRole {
        self.role
    }

    /// Running watcher, if any.
    pub fn watcher(&self) -> Option<&SchedulerHandle> {
        self.watcher.as_ref()
    }

    /// Start the watcher on servers. `factory` runs at most once per mission
    /// and never on clients. Returns whether a watcher was started.
    pub fn on_mission_start<F>(&mut self, factory: F) -> bool
    where
        F: FnOnce() -> ReportScheduler,
    {
        if self.role == ProcessRole::Client {
            debug!("client process, watcher not started");
            return false;
        }
        if self.watcher.is_some() {
            warn!("mission start received twice, keeping the running watcher");
            return false;
        }
        info!("mission started, arming watcher");
        self.watcher = Some(factory().spawn());
        true
    }

    /// Stop the watcher and wait for its task to end.
    pub async fn on_mission_finish(&mut self) -> Option<SchedulerState> {
        let watcher = self.watcher.take()?;
        watcher.stop();
        match watcher.join().await {
            Ok(state) => Some(state),
            Err(err) => {
                error!(%err, "watcher task ended abnormally");
                None
            }
        }
    }
}
