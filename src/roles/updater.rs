//! Role updater service
//!
//! `RoleUpdater` owns the dedup cache and the collaborators shared by the
//! message path and the calendar sweep. `RoleService` adds the running
//! scheduler and is the one object a process creates at start and shuts
//! down on exit.

use super::gate::MessageHandler;
use super::platform::{GuildDirectory, RoleAssigner};
use super::scheduler::{spawn_scheduler, spawn_scheduler_with_clock, Clock, SchedulerConfig, SchedulerHandle};
use super::sweep::{self, SweepReport};
use super::window::WindowCache;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct RoleUpdater {
    pub(crate) directory: Arc<dyn GuildDirectory>,
    pub(crate) assigner: Arc<dyn RoleAssigner>,
    cache: WindowCache,
}

impl RoleUpdater {
    pub fn new(directory: Arc<dyn GuildDirectory>, assigner: Arc<dyn RoleAssigner>) -> Self {
        Self {
            directory,
            assigner,
            cache: WindowCache::new(),
        }
    }

    pub fn cache(&self) -> &WindowCache {
        &self.cache
    }

    /// Sweep the guilds whose calendar mode is due on `today` (UTC)
    pub async fn run_calendar_sweep(&self, today: NaiveDate) -> SweepReport {
        sweep::run_calendar_sweep(self.directory.as_ref(), self.assigner.as_ref(), today).await
    }
}

/// Role updater plus its running timers
pub struct RoleService {
    updater: Arc<RoleUpdater>,
    scheduler: SchedulerHandle,
}

impl RoleService {
    /// Create the updater and start its scheduler
    pub fn start(
        directory: Arc<dyn GuildDirectory>,
        assigner: Arc<dyn RoleAssigner>,
        config: SchedulerConfig,
    ) -> Self {
        let updater = Arc::new(RoleUpdater::new(directory, assigner));
        let scheduler = spawn_scheduler(updater.clone(), config);
        Self { updater, scheduler }
    }

    /// Like `start`, with an explicit wall clock for calendar decisions
    pub fn start_with_clock(
        directory: Arc<dyn GuildDirectory>,
        assigner: Arc<dyn RoleAssigner>,
        config: SchedulerConfig,
        clock: Clock,
    ) -> Self {
        let updater = Arc::new(RoleUpdater::new(directory, assigner));
        let scheduler = spawn_scheduler_with_clock(updater.clone(), config, clock);
        Self { updater, scheduler }
    }

    pub fn updater(&self) -> &Arc<RoleUpdater> {
        &self.updater
    }

    /// Handler to register with the platform client's message events
    pub fn message_handler(&self) -> Arc<dyn MessageHandler> {
        self.updater.clone()
    }

    /// Stop the scheduler and wait for it
    pub async fn shutdown(self) {
        self.scheduler.shutdown().await;
    }
}
