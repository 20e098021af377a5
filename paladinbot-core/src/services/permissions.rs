//! Maps chat badges to capabilities.

use std::collections::HashSet;
use paladinbot_common::models::Permission;

fn badge_capability(badge: &str) -> Option<Permission> {
    match badge {
        "broadcaster" => Some(Permission::Broadcaster),
        "moderator" => Some(Permission::Moderator),
        "vip" => Some(Permission::Vip),
        "admin" | "staff" => Some(Permission::Admin),
        _ => None,
    }
}

/// Capabilities granted by a badge list. Unknown badges grant nothing.
pub fn capabilities_for_badges<S: AsRef<str>>(badges: &[S]) -> HashSet<Permission> {
    badges
        .iter()
        .filter_map(|b| badge_capability(b.as_ref()))
        .collect()
}

/// `true` when `required` is empty or the badges grant at least one of its
/// entries.
pub fn is_permitted<S: AsRef<str>>(required: &[Permission], badges: &[S]) -> bool {
    if required.is_empty() {
        return true;
    }
    badges
        .iter()
        .filter_map(|b| badge_capability(b.as_ref()))
        .any(|cap| required.contains(&cap))
}

/// Broadcaster and moderators skip custom-command cooldowns.
pub fn can_bypass_cooldown<S: AsRef<str>>(badges: &[S]) -> bool {
    is_permitted(&[Permission::Broadcaster, Permission::Moderator], badges)
}
