//! Error types for the Telegram downloader

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("Invalid identifier format: {0}")]
    FormatError(String),

    #[error("Resolution failed: {0}")]
    ResolutionError(String),

    #[error("No downloadable media: {0}")]
    NoMedia(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Telegram API error: {0}")]
    TelegramError(String),

    #[error("Session file not found: {0}")]
    SessionNotFound(String),

    #[error("Session is locked by another process")]
    SessionLocked,

    #[error("Failed to acquire session lock: {0}")]
    LockError(String),

    #[error("Authorization required")]
    AuthorizationRequired,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<grammers_client::InvocationError> for Error {
    fn from(err: grammers_client::InvocationError) -> Self {
        Error::TelegramError(err.to_string())
    }
}
