//! # Feature: Cooldown Tracker
//!
//! Suppresses further invocations by an actor for a number of ticks after a
//! cooldown-bearing route ran. Uses DashMap for thread-safe concurrent access
//! from the primary context and the ticker task.
//!
//! Cooldowns are keyed by actor only: while an actor has any entry, every
//! cooldown check for that actor fails, whichever route armed it.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Tick-driven countdown per actor replaces the sliding request window
//! - 1.0.0: Initial release with per-user sliding window rate limiting

use dashmap::DashMap;
use log::debug;

use crate::core::ActorId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownEntry {
    /// Pattern of the route that armed the cooldown
    pub route: String,
    /// Ticks left before the entry is removed
    pub remaining: u64,
}

#[derive(Debug, Default)]
pub struct CooldownTracker {
    entries: DashMap<ActorId, CooldownEntry>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a cooldown of `ticks` for `actor`; zero is a no-op
    pub fn arm(&self, actor: ActorId, route: &str, ticks: u64) {
        if ticks == 0 {
            return;
        }
        debug!("Cooldown armed for {actor} by '{route}' ({ticks} ticks)");
        self.entries.insert(
            actor,
            CooldownEntry {
                route: route.to_string(),
                remaining: ticks,
            },
        );
    }

    pub fn is_cooling(&self, actor: ActorId) -> bool {
        self.entries.contains_key(&actor)
    }

    pub fn entry(&self, actor: ActorId) -> Option<CooldownEntry> {
        self.entries.get(&actor).map(|e| e.clone())
    }

    /// Advance every countdown by one tick, removing those that reach zero
    pub fn tick(&self) {
        self.entries.retain(|actor, entry| {
            entry.remaining = entry.remaining.saturating_sub(1);
            if entry.remaining == 0 {
                debug!("Cooldown for {actor} from '{}' expired", entry.route);
                false
            } else {
                true
            }
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_expire() {
        let tracker = CooldownTracker::new();
        let actor = ActorId::new();

        tracker.arm(actor, "heal", 2);
        assert!(tracker.is_cooling(actor));

        tracker.tick();
        assert!(tracker.is_cooling(actor));
        assert_eq!(tracker.entry(actor).unwrap().remaining, 1);

        tracker.tick();
        assert!(!tracker.is_cooling(actor));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_zero_duration_is_disabled() {
        let tracker = CooldownTracker::new();
        let actor = ActorId::new();
        tracker.arm(actor, "heal", 0);
        assert!(!tracker.is_cooling(actor));
    }

    #[test]
    fn test_cooldowns_are_per_actor() {
        let tracker = CooldownTracker::new();
        let first = ActorId::new();
        let second = ActorId::new();

        tracker.arm(first, "heal", 5);
        assert!(tracker.is_cooling(first));
        assert!(!tracker.is_cooling(second));

        tracker.arm(second, "feed", 1);
        tracker.tick();
        assert!(tracker.is_cooling(first));
        assert!(!tracker.is_cooling(second));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_entry_records_arming_route() {
        let tracker = CooldownTracker::new();
        let actor = ActorId::new();
        tracker.arm(actor, "feed", 3);
        assert_eq!(
            tracker.entry(actor),
            Some(CooldownEntry {
                route: "feed".to_string(),
                remaining: 3
            })
        );
    }
}
