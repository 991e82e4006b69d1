//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Request could not be sent, the stream could not be opened, or the
    /// backend answered with a non-success status.
    Transport(String),
    /// A single stream record was malformed. Never fatal to a run.
    StreamDecode(String),
    /// The backend reported a pipeline failure through an `error` record.
    Pipeline(String),
    /// A human decision could not be written to the backend.
    DecisionSubmission(String),
    /// Requested candidate does not exist in the current result set.
    NotFound(String),
    /// Local file-system or I/O failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::StreamDecode(msg) => write!(f, "stream decode: {msg}"),
            Self::Pipeline(msg) => write!(f, "pipeline: {msg}"),
            Self::DecisionSubmission(msg) => write!(f, "decision submission: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl AppError {
    /// The message carried by the error, without its kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Config(msg)
            | Self::Transport(msg)
            | Self::StreamDecode(msg)
            | Self::Pipeline(msg)
            | Self::DecisionSubmission(msg)
            | Self::NotFound(msg)
            | Self::Io(msg) => msg,
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
