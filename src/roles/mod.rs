//! # Rank role synchronization
//!
//! Keeps members' rank roles in line with their reputation:
//! - auto-refresh guilds: the first message of a member in each 30-minute
//!   window triggers a role update (`gate`)
//! - week/month guilds: a daily timer sweeps every ranked member on Mondays
//!   and on the 1st, by UTC date (`sweep`, `scheduler`)
//!
//! Role computation itself is done by the platform's `RoleAssigner`.

pub mod gate;
pub mod platform;
pub mod scheduler;
pub mod sweep;
pub mod updater;
pub mod window;

pub use gate::{GateDecision, MessageHandler};
pub use platform::{
    DirectoryError, GuildDirectory, GuildState, IncomingMessage, Member, Rank, ReputationMode, RoleAccessError,
    RoleAssigner,
};
pub use scheduler::{first_sweep_delay, SchedulerConfig, SchedulerHandle};
pub use sweep::{due_modes, SweepReport};
pub use updater::{RoleService, RoleUpdater};
pub use window::WindowCache;
