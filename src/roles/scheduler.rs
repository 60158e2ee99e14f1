//! Background timers for the role updater
//!
//! One tokio task drives two intervals:
//! - window reset: clears the dedup cache every 30 minutes, first tick 30
//!   minutes after start
//! - calendar sweep: every 24 hours, first tick at 01:00 UTC on the day after
//!   start, so sweeps always run shortly after midnight UTC whenever the
//!   process was started
//!
//! Sweeps run on their own spawned task so a slow sweep never holds back the
//! window reset or shutdown. A tick that finds the previous sweep still
//! running is skipped.

use super::updater::RoleUpdater;
use chrono::{DateTime, Days, NaiveTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Source of wall-clock time for calendar decisions
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Dedup window length (cache reset period)
    pub window: Duration,

    /// Period between calendar sweeps
    pub sweep_period: Duration,

    /// UTC time of day of the first sweep
    pub sweep_time: NaiveTime,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(30 * 60),
            sweep_period: Duration::from_secs(1440 * 60),
            sweep_time: NaiveTime::MIN + chrono::Duration::hours(1),
        }
    }
}

/// Delay from `now` until `sweep_time` on the next UTC day
///
/// Always targets tomorrow, even when today's `sweep_time` is still ahead.
pub fn first_sweep_delay(now: DateTime<Utc>, sweep_time: NaiveTime) -> Duration {
    let tomorrow = now.date_naive() + Days::new(1);
    let target = tomorrow.and_time(sweep_time).and_utc();
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

/// Running timer task. Dropping the handle closes the shutdown channel, which
/// stops the task and its sweep too, but without waiting for them.
pub struct SchedulerHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the timers, abort any in-flight sweep and wait for the task to exit
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            log::error!("❌ Role scheduler task failed: {}", e);
        }
    }
}

/// Spawn the timer task using the system clock
pub fn spawn_scheduler(updater: Arc<RoleUpdater>, config: SchedulerConfig) -> SchedulerHandle {
    spawn_scheduler_with_clock(updater, config, Arc::new(Utc::now))
}

/// Spawn the timer task with an explicit clock
pub fn spawn_scheduler_with_clock(
    updater: Arc<RoleUpdater>,
    config: SchedulerConfig,
    clock: Clock,
) -> SchedulerHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(scheduler_task(updater, config, clock, shutdown_rx));

    SchedulerHandle {
        shutdown_tx: Some(shutdown_tx),
        task,
    }
}

async fn scheduler_task(
    updater: Arc<RoleUpdater>,
    config: SchedulerConfig,
    clock: Clock,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let start = Instant::now();
    let sweep_delay = first_sweep_delay(clock(), config.sweep_time);

    log::info!("⏰ Starting role scheduler");
    log::info!("   ├─ Window reset every {}s", config.window.as_secs());
    log::info!(
        "   └─ Calendar sweep every {}s, first in {}s",
        config.sweep_period.as_secs(),
        sweep_delay.as_secs()
    );

    let mut window_timer = interval_at(start + config.window, config.window);
    let mut sweep_timer = interval_at(start + sweep_delay, config.sweep_period);
    sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut sweep_task: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                log::info!("⚠️  Role scheduler shutting down");
                break;
            }

            _ = window_timer.tick() => {
                let cleared = updater.cache().reset_all();
                log::debug!("🧹 Window reset: {} members cleared", cleared);
            }

            _ = sweep_timer.tick() => {
                if sweep_task.as_ref().is_some_and(|task| !task.is_finished()) {
                    log::warn!("⚠️  Previous calendar sweep still running, skipping this tick");
                    continue;
                }

                let today = clock().date_naive();
                let updater = updater.clone();
                sweep_task = Some(tokio::spawn(async move {
                    updater.run_calendar_sweep(today).await;
                }));
            }
        }
    }

    if let Some(task) = sweep_task {
        if !task.is_finished() {
            log::warn!("⚠️  Aborting in-flight calendar sweep");
        }
        task.abort();
        if let Err(e) = task.await {
            if e.is_panic() {
                log::error!("❌ Calendar sweep task panicked: {}", e);
            }
        }
    }

    log::info!("✅ Role scheduler stopped");
}
