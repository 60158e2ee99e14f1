//! Chat-platform collaborators
//!
//! Role recomputation and guild configuration live outside this crate. The
//! role updater only needs the identifiers and the two capability traits
//! below, so any platform client can plug in.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-guild choice between event-driven and calendar-driven role refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReputationMode {
    /// All-time reputation
    Total,
    /// Reputation of the last 7 days
    RollingWeek,
    /// Reputation of the last 30 days
    RollingMonth,
    /// Reputation of the current calendar week
    Week,
    /// Reputation of the current calendar month
    Month,
}

impl ReputationMode {
    /// Roles follow reputation continuously (refreshed on member activity)
    pub fn is_auto_refresh(self) -> bool {
        matches!(self, Self::Total | Self::RollingWeek | Self::RollingMonth)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Total => "TOTAL",
            Self::RollingWeek => "ROLLING_WEEK",
            Self::RollingMonth => "ROLLING_MONTH",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
        }
    }
}

/// A reputation threshold and the role it grants, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub threshold: i64,
    pub role_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub guild_id: u64,
    pub member_id: u64,
    pub role_ids: Vec<u64>,
}

impl Member {
    pub fn has_role(&self, role_id: u64) -> bool {
        self.role_ids.contains(&role_id)
    }
}

/// Freshly loaded guild: configured ranks plus current members
#[derive(Debug, Clone, Default)]
pub struct GuildState {
    pub guild_id: u64,
    pub ranks: Vec<Rank>,
    pub members: Vec<Member>,
}

impl GuildState {
    pub fn members_with_role(&self, role_id: u64) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(move |m| m.has_role(role_id))
    }
}

/// Message received from the platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// `None` for direct messages
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub message_id: u64,
    /// `None` for webhook and system messages
    pub author: Option<Member>,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Cannot manage role {role_id}: {reason}")]
pub struct RoleAccessError {
    pub role_id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Guild directory error: {0}")]
pub struct DirectoryError(pub String);

/// Recomputes and applies rank roles for one member
#[async_trait]
pub trait RoleAssigner: Send + Sync {
    /// Silent update; fails when a role is above the bot's reach
    async fn update(&self, member: &Member) -> Result<(), RoleAccessError>;

    /// Update that reports problems to users in `channel_id`
    async fn update_reporting(&self, member: &Member, channel_id: u64);
}

/// Guild configuration and platform state
#[async_trait]
pub trait GuildDirectory: Send + Sync {
    async fn reputation_mode(&self, guild_id: u64) -> Result<ReputationMode, DirectoryError>;

    /// Ids of every guild configured with `mode`
    async fn guilds_by_mode(&self, mode: ReputationMode) -> Result<Vec<u64>, DirectoryError>;

    /// Reload ranks and members. `Ok(None)` when the guild is unreachable
    /// (bot removed, shard down).
    async fn load(&self, guild_id: u64) -> Result<Option<GuildState>, DirectoryError>;
}
