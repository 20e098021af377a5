//! Per-user and per-command cooldown gates.
//!
//! Cooldowns live only in process memory and are keyed by the canonical
//! command name, so aliases share a slot with their command.

use std::collections::HashMap;
use std::time::Duration;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Map size past which a successful `can_proceed` sweeps expired entries.
const SWEEP_THRESHOLD: usize = 1000;

#[derive(Debug, Default)]
struct CooldownState {
    global: HashMap<String, Instant>,
    per_user: HashMap<(String, String), Instant>,
}

impl CooldownState {
    fn prune(&mut self, now: Instant) -> usize {
        let before = self.len();
        self.global.retain(|_, expires| *expires > now);
        self.per_user.retain(|_, expires| *expires > now);
        before - self.len()
    }

    fn len(&self) -> usize {
        self.global.len() + self.per_user.len()
    }
}

#[derive(Debug, Default)]
pub struct CooldownTracker {
    state: Mutex<CooldownState>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the global gate for `command`, then the gate for
    /// `(command, login)`. If both are open, starts both windows and returns
    /// `true`. A rejection leaves both maps untouched.
    ///
    /// The whole check-and-set runs under one lock, so two concurrent
    /// callers can never both pass the same gate.
    pub fn can_proceed(
        &self,
        login: &str,
        command: &str,
        user_cooldown_secs: u32,
        global_cooldown_secs: u32,
    ) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();

        if let Some(expires) = state.global.get(command) {
            if *expires > now {
                debug!(command, "global cooldown active");
                return false;
            }
        }

        let user_key = (command.to_string(), login.to_string());
        if let Some(expires) = state.per_user.get(&user_key) {
            if *expires > now {
                debug!(command, user = login, "user cooldown active");
                return false;
            }
        }

        state.global.insert(
            command.to_string(),
            now + Duration::from_secs(u64::from(global_cooldown_secs)),
        );
        state.per_user.insert(
            user_key,
            now + Duration::from_secs(u64::from(user_cooldown_secs)),
        );

        if state.len() > SWEEP_THRESHOLD {
            state.prune(now);
        }
        true
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        self.state.lock().prune(Instant::now())
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn global_rejection_does_not_touch_user_gate() {
        let tracker = CooldownTracker::new();
        assert!(tracker.can_proceed("alice", "ping", 30, 10));
        assert!(!tracker.can_proceed("bob", "ping", 30, 10));

        // bob never started a window, so once the global gate opens he passes
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(tracker.can_proceed("bob", "ping", 30, 10));
    }

    #[tokio::test(start_paused = true)]
    async fn prune_drops_only_expired_entries() {
        let tracker = CooldownTracker::new();
        assert!(tracker.can_proceed("alice", "ping", 30, 10));
        assert_eq!(tracker.len(), 2);

        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(tracker.prune_expired(), 1);
        assert_eq!(tracker.len(), 1);

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(tracker.prune_expired(), 1);
        assert!(tracker.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_callers_get_one_pass() {
        let tracker = std::sync::Arc::new(CooldownTracker::new());
        let start = std::sync::Arc::new(tokio::sync::Barrier::new(64));

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let tracker = tracker.clone();
                let start = start.clone();
                tokio::spawn(async move {
                    start.wait().await;
                    tracker.can_proceed(&format!("user{i}"), "ping", 30, 10)
                })
            })
            .collect();

        let mut passes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                passes += 1;
            }
        }
        assert_eq!(passes, 1);
        assert_eq!(tracker.len(), 2, "only the winner's windows are recorded");
    }
}
