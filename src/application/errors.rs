//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("CI API error: {0}")]
    Api(#[from] CiError),

    #[error("Failed to post message: {0}")]
    Post(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// CI provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CiError {
    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error("No build recorded for {0}")]
    NoBuild(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Travis API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected response: {0}")]
    Parse(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
