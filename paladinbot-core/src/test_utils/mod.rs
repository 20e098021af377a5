//! In-memory collaborators for exercising the engine without Postgres,
//! IRC or Helix.

pub mod fakes;
pub mod fixtures;
pub mod memory;

pub use fakes::{RecordingChatSender, StaticPlatformApi};
pub use fixtures::{chatter, BotFixture, BotFixtureBuilder, TEST_CHANNEL};
pub use memory::{
    MemoryBuiltinCommandRepository, MemoryChatterRepository, MemoryCustomCommandRepository,
    MemoryStreamStatusRepository,
};
