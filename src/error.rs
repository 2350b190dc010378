use thiserror::Error;

/// Stable code for statement build failures and engine-reported errors.
pub const SQLITE_ERROR: &str = "SQLITE_ERROR";
/// Stable code for a process that failed without a message or ran out of time.
pub const SQLITE_BUSY: &str = "SQLITE_BUSY";
/// Stable code for API misuse, such as calling into a closed session.
pub const SQLITE_MISUSE: &str = "SQLITE_MISUSE";

#[derive(Debug, Error)]
pub enum SqliteCliError {
    /// The assembled statement was empty after trimming.
    #[error("empty query")]
    EmptyQuery,

    /// A NaN or infinite float was bound as a value.
    #[error("invalid number {0}")]
    InvalidNumber(f64),

    /// A value with no SQL literal form was bound.
    #[error("incompatible value: {0}")]
    IncompatibleValue(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    /// The statement ends inside a literal, quoted identifier, or block comment.
    #[error("unterminated {0} in statement")]
    UnterminatedStatement(&'static str),

    /// The engine wrote to standard error while running the statement.
    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    /// The engine exited unsuccessfully without a message, or hit the configured timeout.
    #[error("database is busy or the query was too slow: {0}")]
    Busy(String),

    #[error("channel closed")]
    ChannelClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SqliteCliError {
    /// Machine-readable error kind, stable across releases.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SqliteCliError::Busy(_) => SQLITE_BUSY,
            SqliteCliError::ChannelClosed | SqliteCliError::ConfigError(_) => SQLITE_MISUSE,
            _ => SQLITE_ERROR,
        }
    }

    /// True when the error was raised while building a statement, before any process I/O.
    #[must_use]
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            SqliteCliError::EmptyQuery
                | SqliteCliError::InvalidNumber(_)
                | SqliteCliError::IncompatibleValue(_)
                | SqliteCliError::ParameterError(_)
                | SqliteCliError::UnterminatedStatement(_)
        )
    }
}
