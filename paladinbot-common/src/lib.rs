// File: paladinbot-common/src/lib.rs
//! Shared models, errors and collaborator traits for paladinbot.

pub mod error;
pub mod models;
pub mod traits;

pub use error::Error;
