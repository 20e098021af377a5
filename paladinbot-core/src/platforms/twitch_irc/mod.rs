pub mod client;
pub mod runtime;

pub use client::{IrcIncomingEvent, ParsedTwitchMsg, TwitchIrcClient};
pub use runtime::{IrcCredentials, TwitchIrcPlatform};
