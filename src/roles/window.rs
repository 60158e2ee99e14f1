//! Per-window dedup cache for event-triggered role updates
//!
//! Members enter the cache when their roles are recomputed and leave only
//! when the scheduler clears everything at the end of the window. There is no
//! per-member expiry.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Members already refreshed in the current window, keyed by guild
///
/// Shared between message handlers (mark/check) and the scheduler (reset).
/// The lock is only held for set operations, never across I/O.
#[derive(Debug, Default)]
pub struct WindowCache {
    processed: Mutex<HashMap<u64, HashSet<u64>>>,
}

impl WindowCache {
    pub fn new() -> Self {
        Self::default()
    }

    // The map is plain dedup state; a panic elsewhere cannot leave it
    // half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, HashSet<u64>>> {
        self.processed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_processed(&self, guild_id: u64, member_id: u64) -> bool {
        self.lock()
            .get(&guild_id)
            .is_some_and(|members| members.contains(&member_id))
    }

    /// Mark a member as refreshed for this window
    ///
    /// Returns `true` if the member was not yet marked. Check and insert
    /// happen under one lock, so concurrent callers for the same member see
    /// exactly one `true`.
    pub fn mark_processed(&self, guild_id: u64, member_id: u64) -> bool {
        self.lock().entry(guild_id).or_default().insert(member_id)
    }

    /// Clear every guild. Returns how many entries were dropped.
    pub fn reset_all(&self) -> usize {
        let mut processed = self.lock();
        let cleared = processed.values().map(HashSet::len).sum();
        processed.clear();
        cleared
    }

    /// Number of marked members across all guilds
    pub fn len(&self) -> usize {
        self.lock().values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
