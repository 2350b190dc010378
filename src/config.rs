use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;

use crate::client::SqliteCli;
use crate::error::SqliteCliError;
use crate::executor::StatementExecutor;
use crate::types::CallKind;

/// Database path that selects a throwaway database file.
pub const MEMORY_DB: &str = ":memory:";

fn default_bin() -> String {
    "sqlite3".to_owned()
}

/// How statements reach the `sqlite3` shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Spawn a fresh process for every statement.
    #[default]
    OneShot,
    /// Drive one long-lived interactive process for every statement.
    Persistent,
}

/// Options for running statements through the `sqlite3` command-line shell.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteOptions {
    pub db_path: String,
    #[serde(default = "default_bin")]
    pub bin: String,
    #[serde(default)]
    pub readonly: bool,
    /// Busy timeout in milliseconds; `0` disables it.
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default)]
    pub mode: SessionMode,
    /// Directory for the `:memory:` database file; the system temp dir when unset.
    #[serde(default)]
    pub memory_dir: Option<PathBuf>,
    #[serde(skip)]
    memory_path: OnceLock<PathBuf>,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            bin: default_bin(),
            readonly: false,
            timeout_ms: 0,
            mode: SessionMode::default(),
            memory_dir: None,
            memory_path: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Path handed to `sqlite3`. `:memory:` resolves to one temp file per options value, so
    /// every process spawned from these options sees the same data.
    #[must_use]
    pub fn resolved_db_path(&self) -> String {
        if self.db_path != MEMORY_DB {
            return self.db_path.clone();
        }
        self.memory_path
            .get_or_init(|| {
                let dir = self.memory_dir.clone().unwrap_or_else(std::env::temp_dir);
                dir.join(format!("{}.db", uuid::Uuid::new_v4()))
            })
            .to_string_lossy()
            .into_owned()
    }

    /// Resolve these options into the process invocation shared by both executors.
    ///
    /// # Errors
    /// Returns `SqliteCliError::ConfigError` if the binary or database path is empty.
    pub fn invocation(&self) -> Result<Invocation, SqliteCliError> {
        if self.bin.trim().is_empty() {
            return Err(SqliteCliError::ConfigError("sqlite3 binary path is empty".into()));
        }
        if self.db_path.trim().is_empty() {
            return Err(SqliteCliError::ConfigError("database path is empty".into()));
        }
        Ok(Invocation {
            bin: self.bin.clone(),
            db_path: self.resolved_db_path(),
            readonly: self.readonly,
            timeout: self.timeout(),
        })
    }
}

/// Executable and flags for spawning `sqlite3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub bin: String,
    pub db_path: String,
    pub readonly: bool,
    pub timeout: Option<Duration>,
}

impl Invocation {
    fn common_args(&self) -> Vec<String> {
        let mut args = vec![self.db_path.clone()];
        if self.readonly {
            args.push("-readonly".to_owned());
        }
        if let Some(timeout) = self.timeout {
            args.push("-cmd".to_owned());
            args.push(format!(".timeout {}", timeout.as_millis()));
        }
        args
    }

    /// Arguments for a one-shot process; the statement is appended by the executor.
    #[must_use]
    pub fn one_shot_args(&self, kind: CallKind) -> Vec<String> {
        let mut args = self.common_args();
        args.insert(1, "-bail".to_owned());
        if kind.is_structured() {
            args.push("-json".to_owned());
        }
        args
    }

    /// Arguments for a persistent session. No `-bail`, so one failed statement does not end
    /// the process; always JSON so structured and raw calls share the session.
    #[must_use]
    pub fn session_args(&self) -> Vec<String> {
        let mut args = self.common_args();
        args.push("-json".to_owned());
        args
    }
}

/// Fluent builder for [`SqliteOptions`].
#[derive(Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
    executor: Option<Arc<dyn StatementExecutor>>,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
            executor: None,
        }
    }

    #[must_use]
    pub fn bin(mut self, bin: impl Into<String>) -> Self {
        self.opts.bin = bin.into();
        self
    }

    #[must_use]
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.opts.readonly = readonly;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: SessionMode) -> Self {
        self.opts.mode = mode;
        self
    }

    #[must_use]
    pub fn persistent(self, persistent: bool) -> Self {
        self.mode(if persistent {
            SessionMode::Persistent
        } else {
            SessionMode::OneShot
        })
    }

    #[must_use]
    pub fn memory_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.opts.memory_dir = Some(dir.into());
        self
    }

    /// Replace the spawn logic entirely; `mode` and the process options are then unused.
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn StatementExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build a ready [`SqliteCli`], starting the session process in persistent mode.
    ///
    /// # Errors
    ///
    /// Returns `SqliteCliError` if the options are invalid or the session process cannot start.
    pub async fn build(self) -> Result<SqliteCli, SqliteCliError> {
        match self.executor {
            Some(executor) => Ok(SqliteCli::with_executor(executor)),
            None => SqliteCli::new(self.opts).await,
        }
    }
}
