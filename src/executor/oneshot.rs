use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::Invocation;
use crate::error::SqliteCliError;
use crate::statement::Statement;
use crate::types::CallKind;

use super::output::{QueryOutput, shape_output};
use super::StatementExecutor;

/// Runs every statement in its own short-lived `sqlite3` process.
#[derive(Debug, Clone)]
pub struct OneShotExecutor {
    invocation: Invocation,
}

impl OneShotExecutor {
    #[must_use]
    pub fn new(invocation: Invocation) -> Self {
        Self { invocation }
    }
}

#[async_trait]
impl StatementExecutor for OneShotExecutor {
    async fn execute(
        &self,
        statement: Statement,
        kind: CallKind,
    ) -> Result<QueryOutput, SqliteCliError> {
        let mut command = Command::new(&self.invocation.bin);
        command
            .args(self.invocation.one_shot_args(kind))
            .arg(statement.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|err| {
            SqliteCliError::ConnectionError(format!(
                "failed to spawn {}: {err}",
                self.invocation.bin
            ))
        })?;
        debug!(kind = %kind, pid = ?child.id(), "spawned sqlite3");

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match self.invocation.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    return Err(SqliteCliError::Busy(format!(
                        "no result within {} ms",
                        limit.as_millis()
                    )));
                }
            },
            None => child.wait_with_output().await?,
        };

        interpret_output(&output, kind)
    }
}

/// Map a finished process onto a result: standard error wins, then exit status, then stdout.
pub(crate) fn interpret_output(
    output: &Output,
    kind: CallKind,
) -> Result<QueryOutput, SqliteCliError> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return Err(SqliteCliError::ExecutionError(stderr.to_owned()));
    }
    if !output.status.success() {
        return Err(SqliteCliError::Busy(output.status.to_string()));
    }
    shape_output(&String::from_utf8_lossy(&output.stdout), kind)
}
