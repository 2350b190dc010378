use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::config::{SessionMode, SqliteOptions, SqliteOptionsBuilder};
use crate::error::SqliteCliError;
use crate::executor::{OneShotExecutor, StatementExecutor};
use crate::session::SessionChannel;
use crate::statement::Template;
use crate::transaction::Transaction;
use crate::types::{CallKind, RawSql, Row};

/// Templated SQL against the `sqlite3` command-line shell.
///
/// ```rust,no_run
/// use sqlite_cli_middleware::prelude::*;
/// use sqlite_cli_middleware::sql;
///
/// # async fn demo() -> Result<(), SqliteCliError> {
/// let db = SqliteCli::builder("app.db".into()).persistent(true).build().await?;
/// db.query("CREATE TABLE IF NOT EXISTS lorem (info TEXT)").await?;
/// db.query(sql!("INSERT INTO lorem VALUES ({})", "it's safe")).await?;
/// let row = db.get(sql!("SELECT info FROM lorem WHERE info = {}", "it's safe")).await?;
/// assert!(row.is_some());
/// db.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqliteCli {
    executor: Arc<dyn StatementExecutor>,
}

impl SqliteCli {
    #[must_use]
    pub fn builder(db_path: String) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    /// Create a client; persistent mode starts the session process immediately.
    ///
    /// # Errors
    /// Returns `SqliteCliError` if the options are invalid or the session cannot start.
    pub async fn new(options: SqliteOptions) -> Result<Self, SqliteCliError> {
        let invocation = options.invocation()?;
        let executor: Arc<dyn StatementExecutor> = match options.mode {
            SessionMode::OneShot => Arc::new(OneShotExecutor::new(invocation)),
            SessionMode::Persistent => Arc::new(SessionChannel::spawn(&invocation)?),
        };
        Ok(Self { executor })
    }

    /// Client over a caller-supplied executor.
    #[must_use]
    pub fn with_executor(executor: Arc<dyn StatementExecutor>) -> Self {
        Self { executor }
    }

    /// Run a statement and return whatever text the shell printed, trimmed.
    ///
    /// # Errors
    /// Returns a build error before any I/O, or the engine's error.
    pub async fn query(&self, template: impl Into<Template>) -> Result<String, SqliteCliError> {
        let statement = template.into().build()?;
        self.executor
            .execute(statement, CallKind::Query)
            .await?
            .into_text()
    }

    /// Run a statement and return its first row. A bare `SELECT` gets ` LIMIT 1`.
    ///
    /// # Errors
    /// Returns a build error before any I/O, or the engine's error.
    pub async fn get(&self, template: impl Into<Template>) -> Result<Option<Row>, SqliteCliError> {
        let statement = template.into().build()?.limit_single_row();
        self.executor
            .execute(statement, CallKind::Get)
            .await?
            .into_row()
    }

    /// Run a statement and return every row.
    ///
    /// # Errors
    /// Returns a build error before any I/O, or the engine's error.
    pub async fn all(&self, template: impl Into<Template>) -> Result<Vec<Row>, SqliteCliError> {
        let statement = template.into().build()?;
        self.executor
            .execute(statement, CallKind::All)
            .await?
            .into_rows()
    }

    /// [`SqliteCli::get`], deserialized into `T`.
    ///
    /// # Errors
    /// As [`SqliteCli::get`], plus `SqliteCliError::Json` if the row does not fit `T`.
    pub async fn get_as<T: DeserializeOwned>(
        &self,
        template: impl Into<Template>,
    ) -> Result<Option<T>, SqliteCliError> {
        self.get(template)
            .await?
            .map(|row| serde_json::from_value(JsonValue::Object(row)))
            .transpose()
            .map_err(SqliteCliError::from)
    }

    /// [`SqliteCli::all`], deserialized into `T`.
    ///
    /// # Errors
    /// As [`SqliteCli::all`], plus `SqliteCliError::Json` if a row does not fit `T`.
    pub async fn all_as<T: DeserializeOwned>(
        &self,
        template: impl Into<Template>,
    ) -> Result<Vec<T>, SqliteCliError> {
        self.all(template)
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(JsonValue::Object(row)).map_err(SqliteCliError::from))
            .collect()
    }

    /// Mark a template's text as pre-escaped, e.g. for a dynamic table name.
    ///
    /// # Errors
    /// Returns a parameter error if placeholders and values do not line up.
    pub fn raw(&self, template: impl Into<Template>) -> Result<RawSql, SqliteCliError> {
        template.into().into_raw()
    }

    /// Start collecting statements for one atomic batch.
    #[must_use]
    pub fn transaction(&self) -> Transaction {
        Transaction::new(Arc::clone(&self.executor))
    }

    /// End the persistent session; a no-op in one-shot mode.
    ///
    /// # Errors
    /// Returns `SqliteCliError` if the session process could not be shut down cleanly.
    pub async fn close(&self) -> Result<(), SqliteCliError> {
        self.executor.close().await
    }
}

impl fmt::Debug for SqliteCli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCli").finish_non_exhaustive()
    }
}
