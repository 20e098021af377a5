// ================================================================
// File: paladinbot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

/// Failures of custom-command CRUD in the command registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("command '{0}' already exists")]
    AlreadyExists(String),

    #[error("command '{0}' does not exist")]
    NotFound(String),

    #[error("'{0}' is not a valid command name")]
    InvalidName(String),

    #[error("storage failure: {0}")]
    Storage(#[from] Error),
}

/// What a built-in command body can fail with.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Malformed invocation; the hint is shown to the chatter.
    #[error("usage: {0}")]
    Usage(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A collaborator (storage, platform API) failed.
    #[error("command failed: {0}")]
    Failed(#[from] Error),
}
