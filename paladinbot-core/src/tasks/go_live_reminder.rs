use std::sync::Arc;
use chrono::NaiveTime;
use tracing::{debug, error, info};
use paladinbot_common::traits::api::{ChatSender, PlatformApi};

pub const GO_LIVE_REMINDER_TEXT: &str = "GOLIVERIGHTNOWMADGE";

/// Local time of day, in the bot's time zone, the reminder goes out.
pub fn go_live_reminder_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

/// Nags the channel when the broadcaster is not live. Returns whether a
/// reminder was sent. A failed stream lookup sends nothing.
pub async fn remind_if_offline(
    api: Arc<dyn PlatformApi>,
    sender: Arc<dyn ChatSender>,
    channel: String,
) -> bool {
    let streams = match api.get_streams(std::slice::from_ref(&channel)).await {
        Ok(streams) => streams,
        Err(e) => {
            error!("go-live reminder could not check stream status: {}", e);
            return false;
        }
    };

    if streams.iter().any(|s| s.user_login.eq_ignore_ascii_case(&channel)) {
        debug!(%channel, "channel is live; no reminder");
        return false;
    }

    match sender.send_message(&channel, GO_LIVE_REMINDER_TEXT).await {
        Ok(()) => {
            info!(%channel, "go-live reminder sent");
            true
        }
        Err(e) => {
            error!("failed to send go-live reminder: {}", e);
            false
        }
    }
}
