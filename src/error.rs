//! Error taxonomy shared by the round, history and session layers.

use thiserror::Error;

/// A die face or threshold outside the inclusive range `1..=100`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("value {value} is outside the range 1..=100")]
pub struct RangeError {
    pub value: i64,
}

/// A history log holding more entries than the bound allows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("history holds {len} entries, at most {max} are allowed")]
pub struct HistoryTooLong {
    pub len: usize,
    pub max: usize,
}

/// A fixed dice sequence built from no faces.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("a fixed dice sequence needs at least one face")]
pub struct NoFaces;

/// Persisted history text that could not be turned back into a log.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed history data: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failures of the durable key/value store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Nothing stored under the key yet. Expected on first run.
    #[error("no value stored under key '{key}'")]
    NotFound { key: String },

    #[error("invalid storage key '{key}'")]
    InvalidKey { key: String },

    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode history for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored value for key '{key}' is unreadable: {source}")]
    Parse {
        key: String,
        #[source]
        source: ParseError,
    },
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Rejected game session requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a roll is already in progress")]
    AlreadyRolling,

    #[error("invalid threshold: {0}")]
    InvalidThreshold(#[from] RangeError),
}
