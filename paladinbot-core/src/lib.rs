// src/lib.rs

pub mod db;
pub mod repositories;
pub mod platforms;
pub mod tasks;
pub mod eventbus;
pub mod services;
pub mod settings;
pub mod utils;
pub mod web;
pub mod test_utils;

pub use db::Database;
pub use paladinbot_common::error::Error;
pub use settings::BotSettings;
