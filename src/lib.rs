//! Async, injection-safe templated SQL over the `sqlite3` command-line shell.
//!
//! Statements are built from templates whose values are encoded as SQL literals, then run
//! either in a fresh `sqlite3` process per call ([`SessionMode::OneShot`]) or through one
//! long-lived interactive process shared by every caller ([`SessionMode::Persistent`]).

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod session;
pub mod statement;
pub mod transaction;
pub mod types;

pub use client::SqliteCli;
pub use config::{Invocation, MEMORY_DB, SessionMode, SqliteOptions, SqliteOptionsBuilder};
pub use error::SqliteCliError;
pub use executor::{OneShotExecutor, QueryOutput, StatementExecutor};
pub use session::SessionChannel;
pub use statement::{Statement, Template, encode};
pub use transaction::Transaction;
pub use types::{CallKind, RawSql, Row, SqlValue};
