use thiserror::Error;

use crate::domain::{ErrorInfo, ErrorKind};

#[derive(Error, Debug)]
pub enum TidingsError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded with {message}")]
    Protocol {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed entry: {0}")]
    Mapping(String),

    #[error("Article has no URL and cannot be bookmarked")]
    NotPersistable,

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl TidingsError {
    pub fn protocol(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = match status {
            Some(code) => format!("HTTP {}: {}", code, message),
            None => format!("an error: {}", message),
        };
        Self::Protocol { status, message }
    }

    /// Poisoned locks are reported as storage failures.
    pub fn lock_poisoned(e: impl std::fmt::Display) -> Self {
        Self::Storage(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(e.to_string()),
        ))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TidingsError::Transport(_) | TidingsError::Io(_) => ErrorKind::Transport,
            TidingsError::Protocol { .. } | TidingsError::InvalidUrl(_) => ErrorKind::Protocol,
            TidingsError::Mapping(_) => ErrorKind::Mapping,
            TidingsError::NotPersistable => ErrorKind::NotPersistable,
            TidingsError::Storage(_) | TidingsError::Migration(_) => ErrorKind::Storage,
            TidingsError::Config(_) | TidingsError::Other(_) => ErrorKind::Other,
        }
    }

    pub fn info(&self) -> ErrorInfo {
        ErrorInfo::new(self.kind(), self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TidingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_message_with_status() {
        let err = TidingsError::protocol(Some(429), "rateLimited");
        assert_eq!(err.to_string(), "Server responded with HTTP 429: rateLimited");
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_protocol_error_message_without_status() {
        let err = TidingsError::protocol(None, "apiKeyInvalid");
        assert_eq!(err.to_string(), "Server responded with an error: apiKeyInvalid");
    }

    #[test]
    fn test_info_carries_kind_and_message() {
        let info = TidingsError::NotPersistable.info();
        assert_eq!(info.kind, ErrorKind::NotPersistable);
        assert!(info.message.contains("no URL"));
    }

    #[test]
    fn test_lock_poisoned_is_storage() {
        assert_eq!(
            TidingsError::lock_poisoned("poisoned").kind(),
            ErrorKind::Storage
        );
    }
}
