use tokio::sync::oneshot;

use crate::error::SqliteCliError;
use crate::executor::QueryOutput;
use crate::statement::Statement;
use crate::types::CallKind;

pub(super) type Responder = oneshot::Sender<Result<QueryOutput, SqliteCliError>>;

pub(super) enum Command {
    Execute {
        statement: Statement,
        kind: CallKind,
        respond_to: Responder,
    },
    Close {
        respond_to: oneshot::Sender<Result<(), SqliteCliError>>,
    },
}

impl Command {
    /// Answer the command without touching the process.
    pub(super) fn reject(self, err: SqliteCliError) {
        match self {
            Command::Execute { respond_to, .. } => {
                let _ = respond_to.send(Err(err));
            }
            Command::Close { respond_to } => {
                let _ = respond_to.send(Ok(()));
            }
        }
    }
}
