//! Error types for datepoll.

use thiserror::Error;

/// A single date value that could not be turned into a `DateKey`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("Invalid date '{0}'. Expected YYYY-MM-DD or an ISO-8601 date-time")]
    Invalid(String),
}

/// A share token that is not in the expected serialized shape at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Share token is empty")]
    Empty,

    #[error("Share token is not valid base64: {0}")]
    Base64(String),

    #[error("Share token is not valid UTF-8")]
    Utf8,

    #[error("Share token payload is malformed: {0}")]
    Payload(String),
}

/// Errors that can occur in datepoll operations.
#[derive(Error, Debug)]
pub enum DatePollError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid participant name: {0}")]
    InvalidParticipant(String),

    #[error("No participant identified yet. Run `datepoll join <name>` first")]
    NotIdentified,

    #[error("Stored selections are unreadable: {0}. Fix the file or run `datepoll import`")]
    UnreadableSelections(String),

    #[error(transparent)]
    DateParse(#[from] DateParseError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DatePollError {
    fn from(e: serde_json::Error) -> Self {
        DatePollError::Serialization(e.to_string())
    }
}

/// Result type alias for datepoll operations.
pub type DatePollResult<T> = Result<T, DatePollError>;
