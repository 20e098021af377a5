// File: paladinbot-common/src/models/mod.rs
pub mod chatter;
pub mod command;
pub mod permission;
pub mod platform;
pub mod stream;

pub use chatter::{ChatMessage, Chatter, SubscriptionNotice};
pub use command::{BuiltinCommandRecord, CommandConditions, CustomCommand};
pub use permission::Permission;
pub use platform::{ChannelInfo, LiveStream, TwitchUser};
pub use stream::{CategoryRef, StreamMetadata, StreamStatus};
