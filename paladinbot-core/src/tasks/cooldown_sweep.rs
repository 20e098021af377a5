use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use crate::services::CooldownTracker;

pub const COOLDOWN_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// Drops expired cooldown entries so the maps stay bounded between bursts.
pub fn sweep_cooldowns(cooldowns: &Arc<CooldownTracker>) -> usize {
    let removed = cooldowns.prune_expired();
    if removed > 0 {
        debug!(removed, remaining = cooldowns.len(), "expired cooldowns pruned");
    }
    removed
}
