//! Cooldown tracker - per-user, per-command rate limiting
//!
//! Entries are only evicted lazily, when the same key is checked after it
//! expired. The map grows with the number of distinct (user, command) pairs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

type Key = (String, String);

/// Tracks cooldown expiry per (user, command)
#[derive(Default)]
pub struct CooldownTracker {
    expiries: Mutex<HashMap<Key, Instant>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining whole seconds (rounded up) if `user` is still cooling down on `command`
    pub fn check(&self, user: &str, command: &str) -> Option<u64> {
        self.check_at(user, command, Instant::now())
    }

    pub fn check_at(&self, user: &str, command: &str, now: Instant) -> Option<u64> {
        let mut expiries = self.lock();
        let key = (user.to_string(), command.to_string());

        let expiry = *expiries.get(&key)?;
        if now >= expiry {
            expiries.remove(&key);
            return None;
        }

        Some(ceil_secs(expiry - now))
    }

    /// Start a cooldown of `seconds` for `user` on `command`, replacing any previous one
    pub fn set(&self, user: &str, command: &str, seconds: u64) {
        self.set_at(user, command, seconds, Instant::now());
    }

    pub fn set_at(&self, user: &str, command: &str, seconds: u64, now: Instant) {
        if seconds == 0 {
            return;
        }
        let expiry = now + Duration::from_secs(seconds);
        self.lock().insert((user.to_string(), command.to_string()), expiry);
    }

    /// Check and start in one step: `Err(remaining)` while cooling down,
    /// otherwise records a new cooldown of `seconds` and returns `Ok`
    pub fn try_start(&self, user: &str, command: &str, seconds: u64) -> Result<(), u64> {
        self.try_start_at(user, command, seconds, Instant::now())
    }

    pub fn try_start_at(
        &self,
        user: &str,
        command: &str,
        seconds: u64,
        now: Instant,
    ) -> Result<(), u64> {
        let mut expiries = self.lock();
        let key = (user.to_string(), command.to_string());

        if let Some(&expiry) = expiries.get(&key) {
            if now < expiry {
                return Err(ceil_secs(expiry - now));
            }
            expiries.remove(&key);
        }

        if seconds > 0 {
            expiries.insert(key, now + Duration::from_secs(seconds));
        }
        Ok(())
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, Instant>> {
        self.expiries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_call_within_window_is_limited() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();

        assert_eq!(tracker.check_at("alice", "ping", start), None);
        tracker.set_at("alice", "ping", 3, start);

        let remaining = tracker.check_at("alice", "ping", start + Duration::from_millis(200));
        assert_eq!(remaining, Some(3));
        let remaining = tracker.check_at("alice", "ping", start + Duration::from_millis(2500));
        assert_eq!(remaining, Some(1));
    }

    #[test]
    fn test_expired_entry_is_removed_on_check() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        tracker.set_at("alice", "ping", 3, start);
        assert_eq!(tracker.len(), 1);

        assert_eq!(tracker.check_at("alice", "ping", start + Duration::from_secs(3)), None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_keys_are_independent() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        tracker.set_at("alice", "ping", 5, start);

        assert_eq!(tracker.check_at("bob", "ping", start), None);
        assert_eq!(tracker.check_at("alice", "menu", start), None);
        assert_eq!(tracker.check_at("alice", "ping", start), Some(5));
    }

    #[test]
    fn test_set_overwrites_and_zero_is_ignored() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();
        tracker.set_at("alice", "ping", 3, start);
        tracker.set_at("alice", "ping", 10, start + Duration::from_secs(1));
        assert_eq!(tracker.check_at("alice", "ping", start + Duration::from_secs(2)), Some(9));

        tracker.set_at("bob", "ping", 0, start);
        assert_eq!(tracker.check_at("bob", "ping", start), None);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_try_start_is_check_then_set() {
        let tracker = CooldownTracker::new();
        let start = Instant::now();

        assert_eq!(tracker.try_start_at("alice", "ping", 3, start), Ok(()));
        assert_eq!(
            tracker.try_start_at("alice", "ping", 3, start + Duration::from_millis(500)),
            Err(3)
        );
        // a denied attempt does not extend the window
        assert_eq!(
            tracker.try_start_at("alice", "ping", 3, start + Duration::from_secs(3)),
            Ok(())
        );
        assert_eq!(
            tracker.check_at("alice", "ping", start + Duration::from_secs(4)),
            Some(2)
        );
    }

    #[test]
    fn test_concurrent_try_start_admits_one_caller() {
        let tracker = CooldownTracker::new();

        let admitted = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| tracker.try_start("alice", "ping", 30).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(admitted, 1);
        assert!(tracker.check("alice", "ping").is_some());
    }
}
