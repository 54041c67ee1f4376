//! Error types for target parsing and the target store

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("invalid date-time '{input}': expected YYYY-MM-DDTHH:MM[:SS]")]
    InvalidDateTime { input: String },

    /// Local time that does not exist in the calendar zone (DST gap)
    #[error("local time '{input}' does not exist in {timezone}")]
    NonexistentLocalTime { input: String, timezone: String },

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("target label cannot be empty")]
    EmptyLabel,

    #[error("no target with id '{0}'")]
    TargetNotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}
