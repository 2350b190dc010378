use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::error::SqliteCliError;
use crate::types::CallKind;

use super::channel::Command;
use super::process::{Exchange, SessionProcess};

fn process_gone() -> SqliteCliError {
    SqliteCliError::ConnectionError("sqlite3 session process has exited".into())
}

/// Drain the command queue one exchange at a time until closed or every handle is dropped.
pub(super) async fn run_session(
    process: SessionProcess,
    mut receiver: mpsc::UnboundedReceiver<Command>,
) {
    let mut process = Some(process);

    while let Some(command) = receiver.recv().await {
        match command {
            Command::Execute {
                statement,
                kind,
                respond_to,
            } => {
                let Some(session) = process.as_mut() else {
                    let _ = respond_to.send(Err(process_gone()));
                    continue;
                };
                trace!(kind = %kind, bytes = statement.as_str().len(), "dispatching statement");
                let mut outcome = session.exchange(statement.as_str(), kind, respond_to).await;
                if outcome == Exchange::Failed && kind == CallKind::Batch {
                    outcome = rollback(session).await;
                }
                if outcome == Exchange::Died {
                    process = None;
                }
            }
            Command::Close { respond_to } => {
                receiver.close();
                let result = match process.take() {
                    Some(session) => session.shutdown().await,
                    None => Ok(()),
                };
                while let Some(late) = receiver.recv().await {
                    late.reject(SqliteCliError::ChannelClosed);
                }
                let _ = respond_to.send(result);
                return;
            }
        }
    }

    debug!("all session handles dropped; shutting down sqlite3");
    if let Some(session) = process.take()
        && let Err(err) = session.shutdown().await
    {
        warn!(error = %err, "sqlite3 session shutdown failed");
    }
}

/// The shell stops a compound statement at the first error, leaving its `BEGIN` open.
async fn rollback(session: &mut SessionProcess) -> Exchange {
    let (tx, rx) = oneshot::channel();
    let outcome = session.exchange("ROLLBACK", CallKind::Query, tx).await;
    if let Ok(Err(err)) = rx.await {
        debug!(error = %err, "rollback after failed batch");
    }
    outcome
}
