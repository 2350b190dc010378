use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::SqliteCliError;
use crate::executor::StatementExecutor;
use crate::statement::{Statement, Template};
use crate::types::CallKind;

/// Statements collected for one atomic `BEGIN TRANSACTION ... COMMIT` submission.
///
/// Nothing runs until [`Transaction::commit`], which consumes the buffer.
pub struct Transaction {
    executor: Arc<dyn StatementExecutor>,
    templates: Vec<Template>,
}

impl Transaction {
    pub(crate) fn new(executor: Arc<dyn StatementExecutor>) -> Self {
        Self {
            executor,
            templates: Vec::new(),
        }
    }

    /// Queue a statement; it is built at commit time.
    pub fn append(&mut self, template: impl Into<Template>) -> &mut Self {
        self.templates.push(template.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Build every queued statement and submit them as one batch.
    ///
    /// # Errors
    /// If any statement fails to build, that error is returned and nothing is sent. Otherwise
    /// returns the executor's error for the batch; the engine rolls the batch back.
    pub async fn commit(self) -> Result<String, SqliteCliError> {
        let statements = self
            .templates
            .iter()
            .map(Template::build)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(statements = statements.len(), "committing transaction");
        self.executor
            .execute(Statement::transaction(&statements), CallKind::Batch)
            .await?
            .into_text()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}
