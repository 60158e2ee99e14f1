//! Calendar-driven bulk role refresh
//!
//! Guilds in `Week` mode are swept on Mondays, guilds in `Month` mode on the
//! 1st, both by UTC date. A Monday the 1st runs both sweeps; a guild is only
//! in one mode, so nothing is swept twice.

use super::platform::{GuildDirectory, ReputationMode, RoleAssigner};
use chrono::{Datelike, NaiveDate, Weekday};

/// Counters for one sweep run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub guilds_swept: usize,
    pub guilds_skipped: usize,
    pub members_updated: usize,
    pub failures: usize,
}

impl SweepReport {
    fn merge(&mut self, other: SweepReport) {
        self.guilds_swept += other.guilds_swept;
        self.guilds_skipped += other.guilds_skipped;
        self.members_updated += other.members_updated;
        self.failures += other.failures;
    }
}

/// Modes due for a sweep on `date` (UTC)
pub fn due_modes(date: NaiveDate) -> Vec<ReputationMode> {
    let mut modes = Vec::with_capacity(2);
    if date.day() == 1 {
        modes.push(ReputationMode::Month);
    }
    if date.weekday() == Weekday::Mon {
        modes.push(ReputationMode::Week);
    }
    modes
}

/// Sweep every guild whose mode is due on `date`
pub async fn run_calendar_sweep(
    directory: &dyn GuildDirectory,
    assigner: &dyn RoleAssigner,
    date: NaiveDate,
) -> SweepReport {
    let modes = due_modes(date);
    let mut report = SweepReport::default();

    if modes.is_empty() {
        log::debug!("No calendar sweep due on {}", date);
        return report;
    }

    for mode in modes {
        let guilds = match directory.guilds_by_mode(mode).await {
            Ok(guilds) => guilds,
            Err(e) => {
                log::error!("❌ Failed to list {} guilds for sweep: {}", mode.as_str(), e);
                continue;
            }
        };

        log::info!("🔄 {} sweep on {}: {} guilds", mode.as_str(), date, guilds.len());

        for guild_id in guilds {
            report.merge(sweep_guild(directory, assigner, guild_id).await);
        }
    }

    log::info!(
        "✅ Calendar sweep done: {} guilds swept, {} skipped, {} members updated, {} failures",
        report.guilds_swept,
        report.guilds_skipped,
        report.members_updated,
        report.failures
    );

    report
}

/// Recompute roles of every member holding a ranked role in one guild
///
/// A refused update is logged and the sweep moves on to the next member.
pub async fn sweep_guild(
    directory: &dyn GuildDirectory,
    assigner: &dyn RoleAssigner,
    guild_id: u64,
) -> SweepReport {
    let mut report = SweepReport::default();

    let guild = match directory.load(guild_id).await {
        Ok(Some(guild)) => guild,
        Ok(None) => {
            log::warn!("⚠️  Guild {} unreachable, skipping sweep", guild_id);
            report.guilds_skipped = 1;
            return report;
        }
        Err(e) => {
            log::warn!("⚠️  Failed to load guild {}, skipping sweep: {}", guild_id, e);
            report.guilds_skipped = 1;
            return report;
        }
    };

    for rank in &guild.ranks {
        let Some(role_id) = rank.role_id else {
            continue;
        };

        for member in guild.members_with_role(role_id) {
            match assigner.update(member).await {
                Ok(()) => report.members_updated += 1,
                Err(e) => {
                    report.failures += 1;
                    log::warn!(
                        "⚠️  Role update failed (guild: {}, member: {}, rank role: {}): {}",
                        guild_id,
                        member.member_id,
                        role_id,
                        e
                    );
                }
            }
        }
    }

    report.guilds_swept = 1;
    log::debug!(
        "Guild {} swept: {} members updated, {} failures",
        guild_id,
        report.members_updated,
        report.failures
    );
    report
}
