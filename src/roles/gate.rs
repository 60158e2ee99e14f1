//! Message-received hook for auto-refresh guilds
//!
//! For guilds whose reputation mode refreshes continuously, the first message
//! a member sends in each window triggers a reporting role update. Later
//! messages in the same window are ignored.

use super::platform::IncomingMessage;
use super::updater::RoleUpdater;
use async_trait::async_trait;

/// Capability the platform client calls for every received message
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(&self, message: &IncomingMessage);
}

/// What the gate did with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Not sent in a guild
    NotInGuild,
    /// Guild mode could not be read
    ModeUnavailable,
    /// Guild refreshes on the calendar, not on activity
    NotAutoRefresh,
    /// Webhook or system message
    NoMember,
    /// Member already refreshed in this window
    AlreadyProcessed,
    /// Role update triggered
    Updated,
}

impl RoleUpdater {
    /// Decide whether `message` triggers a role update, and run it if so
    pub async fn handle_message(&self, message: &IncomingMessage) -> GateDecision {
        let Some(guild_id) = message.guild_id else {
            return GateDecision::NotInGuild;
        };

        let mode = match self.directory.reputation_mode(guild_id).await {
            Ok(mode) => mode,
            Err(e) => {
                log::warn!("⚠️  Reputation mode unavailable for guild {}: {}", guild_id, e);
                return GateDecision::ModeUnavailable;
            }
        };
        if !mode.is_auto_refresh() {
            return GateDecision::NotAutoRefresh;
        }

        let Some(member) = message.author.as_ref() else {
            return GateDecision::NoMember;
        };

        // Claim before updating so concurrent messages from the same member
        // trigger one update.
        if !self.cache().mark_processed(guild_id, member.member_id) {
            return GateDecision::AlreadyProcessed;
        }

        log::debug!(
            "🔄 Refreshing roles (guild: {}, member: {}, channel: {})",
            guild_id,
            member.member_id,
            message.channel_id
        );
        self.assigner.update_reporting(member, message.channel_id).await;

        GateDecision::Updated
    }
}

#[async_trait]
impl MessageHandler for RoleUpdater {
    async fn on_message(&self, message: &IncomingMessage) {
        self.handle_message(message).await;
    }
}
