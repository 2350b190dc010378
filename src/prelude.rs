//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types so callers can get started with a
//! single `use`.

pub use crate::client::SqliteCli;
pub use crate::config::{SessionMode, SqliteOptions, SqliteOptionsBuilder};
pub use crate::error::SqliteCliError;
pub use crate::executor::{QueryOutput, StatementExecutor};
pub use crate::statement::{Statement, Template};
pub use crate::transaction::Transaction;
pub use crate::types::{CallKind, RawSql, Row, SqlValue};
