//! Twitch EventSub over webhooks: payload types and the callback handler
//! that feeds stream transitions into the stream-state cache.

pub mod events;
pub mod webhook;

pub use webhook::{handle_eventsub, sign_message, verify_signature};
