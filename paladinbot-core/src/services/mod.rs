pub mod builtin_commands;
pub mod chat_service;
pub mod command_registry;
pub mod cooldown;
pub mod dispatcher;
pub mod permissions;
pub mod stream_state;
pub mod variables;

pub use chat_service::ChatService;
pub use command_registry::CommandRegistry;
pub use cooldown::CooldownTracker;
pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use stream_state::StreamStateCache;
