// src/repositories/postgres/mod.rs

pub mod chatters;
pub mod commands;
pub mod custom_commands;
pub mod stream_status;

pub use chatters::PostgresChatterRepository;
pub use commands::PostgresBuiltinCommandRepository;
pub use custom_commands::PostgresCustomCommandRepository;
pub use stream_status::PostgresStreamStatusRepository;
