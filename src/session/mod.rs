// Persistent-mode execution: one interactive sqlite3 process shared by every caller.
//
// - channel: commands queued to the session worker
// - framing: sentinel codec delimiting responses on stdout
// - process: the child process and a single request/response exchange
// - dispatcher: the worker task draining the queue in FIFO order

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;
use uuid::Uuid;

use crate::config::Invocation;
use crate::error::SqliteCliError;
use crate::executor::{QueryOutput, StatementExecutor};
use crate::statement::Statement;
use crate::types::CallKind;

mod channel;
mod dispatcher;
mod framing;
mod process;

use channel::Command;
use dispatcher::run_session;
use process::SessionProcess;

/// Handle to a persistent `sqlite3` session.
///
/// Clones share the same process. Calls run strictly in submission order, one at a time; an
/// error reported by the engine fails only the call that caused it. The process exits after
/// [`SessionChannel::close`] or once every handle is dropped.
#[derive(Clone)]
pub struct SessionChannel {
    inner: Arc<SessionHandle>,
}

struct SessionHandle {
    sender: mpsc::UnboundedSender<Command>,
    closed: AtomicBool,
    pid: Option<u32>,
}

impl SessionChannel {
    /// Start the `sqlite3` process and its worker task.
    ///
    /// # Errors
    /// Returns `SqliteCliError::ConnectionError` if called outside a Tokio runtime or if the
    /// process cannot be spawned.
    pub fn spawn(invocation: &Invocation) -> Result<Self, SqliteCliError> {
        let handle = Handle::try_current().map_err(|err| {
            SqliteCliError::ConnectionError(format!("sqlite3 session needs a Tokio runtime: {err}"))
        })?;
        let process = SessionProcess::spawn(invocation, Uuid::new_v4())?;
        let pid = process.id();
        let (sender, receiver) = mpsc::unbounded_channel();
        handle.spawn(run_session(process, receiver));
        debug!(?pid, db = %invocation.db_path, "sqlite3 session started");

        Ok(Self {
            inner: Arc::new(SessionHandle {
                sender,
                closed: AtomicBool::new(false),
                pid,
            }),
        })
    }

    /// Queue a statement and wait for its turn and its result.
    ///
    /// # Errors
    /// Returns `SqliteCliError::ChannelClosed` after [`SessionChannel::close`], the engine's
    /// error for a failed statement, or a connection error if the process has died.
    pub async fn execute(
        &self,
        statement: Statement,
        kind: CallKind,
    ) -> Result<QueryOutput, SqliteCliError> {
        if self.is_closed() {
            return Err(SqliteCliError::ChannelClosed);
        }
        let (tx, rx) = oneshot::channel();
        self.inner
            .sender
            .send(Command::Execute {
                statement,
                kind,
                respond_to: tx,
            })
            .map_err(|_| SqliteCliError::ChannelClosed)?;
        rx.await.map_err(|_| {
            SqliteCliError::ConnectionError(
                "sqlite3 session dropped while executing statement".into(),
            )
        })?
    }

    /// Stop accepting calls, let already-queued calls finish, then end the process.
    ///
    /// Closing twice is a no-op.
    ///
    /// # Errors
    /// Returns `SqliteCliError` if the process could not be shut down cleanly.
    pub async fn close(&self) -> Result<(), SqliteCliError> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let (tx, rx) = oneshot::channel();
        if self
            .inner
            .sender
            .send(Command::Close { respond_to: tx })
            .is_err()
        {
            return Ok(());
        }
        rx.await.map_err(|_| {
            SqliteCliError::ConnectionError("sqlite3 session dropped while closing".into())
        })?
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// OS process id of the `sqlite3` child, if it was still running when spawned.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid
    }
}

impl fmt::Debug for SessionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionChannel")
            .field("pid", &self.inner.pid)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl StatementExecutor for SessionChannel {
    async fn execute(
        &self,
        statement: Statement,
        kind: CallKind,
    ) -> Result<QueryOutput, SqliteCliError> {
        SessionChannel::execute(self, statement, kind).await
    }

    async fn close(&self) -> Result<(), SqliteCliError> {
        SessionChannel::close(self).await
    }
}
