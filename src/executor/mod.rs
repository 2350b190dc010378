use async_trait::async_trait;

use crate::error::SqliteCliError;
use crate::statement::Statement;
use crate::types::CallKind;

pub mod oneshot;
pub mod output;

pub use oneshot::OneShotExecutor;
pub use output::{QueryOutput, shape_output};

/// Runs built statements and shapes their output.
///
/// [`OneShotExecutor`] and [`crate::session::SessionChannel`] implement this; a custom
/// implementation can be installed with [`crate::SqliteOptionsBuilder::executor`].
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Run one statement and shape its output for `kind`.
    ///
    /// # Errors
    /// Returns `SqliteCliError` if the process cannot be reached or the engine reports an error.
    async fn execute(
        &self,
        statement: Statement,
        kind: CallKind,
    ) -> Result<QueryOutput, SqliteCliError>;

    /// Release any long-lived process. A no-op for per-call executors.
    ///
    /// # Errors
    /// Returns `SqliteCliError` if shutting the process down fails.
    async fn close(&self) -> Result<(), SqliteCliError> {
        Ok(())
    }
}
