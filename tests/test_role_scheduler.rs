//! Integration tests for the role scheduler timers
//!
//! Tokio time is paused, so sleeping in the test advances the scheduler's
//! intervals deterministically. The wall clock handed to the scheduler is
//! derived from the same paused tokio clock.

#[cfg(test)]
mod role_scheduler_tests {
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use repsync::roles::{
        DirectoryError, GuildDirectory, GuildState, IncomingMessage, Member, MessageHandler, Rank,
        ReputationMode, RoleAccessError, RoleAssigner, RoleService, SchedulerConfig,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    struct StaticDirectory {
        modes: HashMap<u64, ReputationMode>,
        guilds: HashMap<u64, GuildState>,
    }

    #[async_trait]
    impl GuildDirectory for StaticDirectory {
        async fn reputation_mode(&self, guild_id: u64) -> Result<ReputationMode, DirectoryError> {
            self.modes
                .get(&guild_id)
                .copied()
                .ok_or_else(|| DirectoryError(format!("unknown guild {}", guild_id)))
        }

        async fn guilds_by_mode(&self, mode: ReputationMode) -> Result<Vec<u64>, DirectoryError> {
            Ok(self
                .modes
                .iter()
                .filter(|(_, m)| **m == mode)
                .map(|(id, _)| *id)
                .collect())
        }

        async fn load(&self, guild_id: u64) -> Result<Option<GuildState>, DirectoryError> {
            Ok(self.guilds.get(&guild_id).cloned())
        }
    }

    #[derive(Default)]
    struct CountingAssigner {
        silent: Mutex<Vec<u64>>,
        reporting: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl RoleAssigner for CountingAssigner {
        async fn update(&self, member: &Member) -> Result<(), RoleAccessError> {
            self.silent.lock().unwrap().push(member.member_id);
            Ok(())
        }

        async fn update_reporting(&self, member: &Member, _channel_id: u64) {
            self.reporting.lock().unwrap().push(member.member_id);
        }
    }

    /// Assigner whose silent updates take `delay` of (paused) time
    struct SlowAssigner {
        delay: Duration,
        started: Mutex<Vec<u64>>,
        finished: Mutex<Vec<u64>>,
    }

    impl SlowAssigner {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                started: Mutex::new(Vec::new()),
                finished: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RoleAssigner for SlowAssigner {
        async fn update(&self, member: &Member) -> Result<(), RoleAccessError> {
            self.started.lock().unwrap().push(member.member_id);
            tokio::time::sleep(self.delay).await;
            self.finished.lock().unwrap().push(member.member_id);
            Ok(())
        }

        async fn update_reporting(&self, _member: &Member, _channel_id: u64) {}
    }

    fn member(guild_id: u64, member_id: u64, role_ids: Vec<u64>) -> Member {
        Member {
            guild_id,
            member_id,
            role_ids,
        }
    }

    fn directory() -> Arc<StaticDirectory> {
        Arc::new(StaticDirectory {
            modes: HashMap::from([(1, ReputationMode::Month), (2, ReputationMode::RollingWeek)]),
            guilds: HashMap::from([(
                1,
                GuildState {
                    guild_id: 1,
                    ranks: vec![Rank {
                        threshold: 10,
                        role_id: Some(500),
                    }],
                    members: vec![member(1, 10, vec![500]), member(1, 11, vec![])],
                },
            )]),
        })
    }

    /// Wall clock that starts at `base` and follows paused tokio time
    fn paused_clock(base: DateTime<Utc>) -> Arc<dyn Fn() -> DateTime<Utc> + Send + Sync> {
        let start = Instant::now();
        Arc::new(move || base + chrono::Duration::from_std(start.elapsed()).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_sweep_waits_for_next_day_0100() {
        // 2024-08-01 is the 1st of the month: month guilds are due
        let base = Utc.with_ymd_and_hms(2024, 7, 31, 23, 10, 0).unwrap();
        let assigner = Arc::new(CountingAssigner::default());
        let service = RoleService::start_with_clock(
            directory(),
            assigner.clone(),
            SchedulerConfig::default(),
            paused_clock(base),
        );

        // 00:59 on Aug 1st: nothing yet
        tokio::time::sleep(Duration::from_secs(109 * 60)).await;
        assert!(assigner.silent.lock().unwrap().is_empty());

        // 01:01: the sweep has run
        tokio::time::sleep(Duration::from_secs(2 * 60)).await;
        assert_eq!(*assigner.silent.lock().unwrap(), vec![10]);

        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reset_every_30_minutes() {
        let base = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let assigner = Arc::new(CountingAssigner::default());
        let service = RoleService::start_with_clock(
            directory(),
            assigner.clone(),
            SchedulerConfig::default(),
            paused_clock(base),
        );
        let handler = service.message_handler();
        let message = IncomingMessage {
            guild_id: Some(2),
            channel_id: 77,
            message_id: 1,
            author: Some(member(2, 42, vec![])),
        };

        handler.on_message(&message).await;
        tokio::time::sleep(Duration::from_secs(10 * 60)).await;
        handler.on_message(&message).await;
        assert_eq!(assigner.reporting.lock().unwrap().len(), 1);
        assert!(service.updater().cache().is_processed(2, 42));

        // Past the 30-minute mark the window has been cleared
        tokio::time::sleep(Duration::from_secs(21 * 60)).await;
        assert!(!service.updater().cache().is_processed(2, 42));

        handler.on_message(&message).await;
        assert_eq!(assigner.reporting.lock().unwrap().len(), 2);

        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timers() {
        let base = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let assigner = Arc::new(CountingAssigner::default());
        let service = RoleService::start_with_clock(
            directory(),
            assigner.clone(),
            SchedulerConfig::default(),
            paused_clock(base),
        );
        let updater = service.updater().clone();

        updater.cache().mark_processed(2, 42);
        service.shutdown().await;

        // No scheduler left to clear the window
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(updater.cache().is_processed(2, 42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_sweep_does_not_hold_back_window_reset() {
        let base = Utc.with_ymd_and_hms(2024, 7, 31, 23, 10, 0).unwrap();
        let assigner = Arc::new(SlowAssigner::new(Duration::from_secs(2 * 3600)));
        let service = RoleService::start_with_clock(
            directory(),
            assigner.clone(),
            SchedulerConfig::default(),
            paused_clock(base),
        );

        // 01:05, the month sweep started at 01:00 and is still running
        tokio::time::sleep(Duration::from_secs(115 * 60)).await;
        assert_eq!(*assigner.started.lock().unwrap(), vec![10]);
        service.updater().cache().mark_processed(2, 42);

        // 01:45, resets at 01:10 and 01:40 went through
        tokio::time::sleep(Duration::from_secs(40 * 60)).await;
        assert!(!service.updater().cache().is_processed(2, 42));
        assert!(assigner.finished.lock().unwrap().is_empty());

        // Shutdown aborts the sweep instead of waiting two hours for it
        let before = Instant::now();
        service.shutdown().await;
        assert!(Instant::now() - before < Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(3 * 3600)).await;
        assert!(assigner.finished.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_tick_skipped_while_previous_runs() {
        let base = Utc.with_ymd_and_hms(2024, 7, 31, 23, 10, 0).unwrap();
        let assigner = Arc::new(SlowAssigner::new(Duration::from_secs(90 * 60)));
        let config = SchedulerConfig {
            sweep_period: Duration::from_secs(3600),
            ..SchedulerConfig::default()
        };
        let service =
            RoleService::start_with_clock(directory(), assigner.clone(), config, paused_clock(base));

        // 02:45: the 01:00 sweep finished at 02:30, the 02:00 tick was skipped
        tokio::time::sleep(Duration::from_secs(215 * 60)).await;
        assert_eq!(*assigner.started.lock().unwrap(), vec![10]);
        assert_eq!(*assigner.finished.lock().unwrap(), vec![10]);

        // 03:01: the next tick starts a fresh sweep
        tokio::time::sleep(Duration::from_secs(16 * 60)).await;
        assert_eq!(*assigner.started.lock().unwrap(), vec![10, 10]);

        service.shutdown().await;
    }
}
