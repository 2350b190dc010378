use std::process::Stdio;
use std::time::Duration;

use futures_util::{FutureExt, SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio_util::codec::{BytesCodec, FramedRead, FramedWrite};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Invocation;
use crate::error::SqliteCliError;
use crate::executor::shape_output;
use crate::types::CallKind;

use super::channel::Responder;
use super::framing::SentinelCodec;

const EXIT_GRACE: Duration = Duration::from_secs(5);

/// How a single request/response exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Exchange {
    Completed,
    /// The engine reported an error; the sentinel was still observed.
    Failed,
    /// The process stopped responding; no further exchanges are possible.
    Died,
}

/// The interactive `sqlite3` child and its framed standard streams.
pub(super) struct SessionProcess {
    child: Child,
    stdin: FramedWrite<ChildStdin, SentinelCodec>,
    stdout: FramedRead<ChildStdout, SentinelCodec>,
    stderr: FramedRead<ChildStderr, BytesCodec>,
    stderr_open: bool,
}

fn failure_message(stderr: &str) -> String {
    let message = stderr.trim();
    if message.is_empty() {
        "sqlite3 wrote to standard error".to_owned()
    } else {
        message.to_owned()
    }
}

fn missing_pipe(name: &str) -> SqliteCliError {
    SqliteCliError::ConnectionError(format!("sqlite3 {name} was not captured"))
}

impl SessionProcess {
    pub(super) fn spawn(invocation: &Invocation, marker: Uuid) -> Result<Self, SqliteCliError> {
        let mut child = Command::new(&invocation.bin)
            .args(invocation.session_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                SqliteCliError::ConnectionError(format!(
                    "failed to spawn {}: {err}",
                    invocation.bin
                ))
            })?;

        let stdin = child.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;
        let codec = SentinelCodec::new(marker);

        Ok(Self {
            child,
            stdin: FramedWrite::new(stdin, codec.clone()),
            stdout: FramedRead::new(stdout, codec),
            stderr: FramedRead::new(stderr, BytesCodec::new()),
            stderr_open: true,
        })
    }

    pub(super) fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Error output that arrived after the previous call completed cannot be attributed to
    /// the next one; drop it before writing.
    fn discard_stale_stderr(&mut self) {
        while self.stderr_open {
            match self.stderr.next().now_or_never() {
                Some(Some(Ok(bytes))) => {
                    warn!(
                        stderr = %String::from_utf8_lossy(&bytes).trim(),
                        "discarding sqlite3 stderr received between calls"
                    );
                }
                Some(Some(Err(_)) | None) => self.stderr_open = false,
                None => break,
            }
        }
    }

    /// Write one statement and collect its response, answering `respond_to` once the sentinel
    /// (or process exit) is observed. Error text is accumulated across stderr reads so the
    /// caller sees the whole message.
    pub(super) async fn exchange(
        &mut self,
        statement: &str,
        kind: CallKind,
        respond_to: Responder,
    ) -> Exchange {
        self.discard_stale_stderr();

        if let Err(err) = self.stdin.send(statement).await {
            let _ = respond_to.send(Err(SqliteCliError::ConnectionError(format!(
                "failed to write to sqlite3: {err}"
            ))));
            return Exchange::Died;
        }

        let mut error_text: Option<String> = None;
        loop {
            tokio::select! {
                biased;
                chunk = self.stderr.next(), if self.stderr_open => match chunk {
                    Some(Ok(bytes)) => error_text
                        .get_or_insert_with(String::new)
                        .push_str(&String::from_utf8_lossy(&bytes)),
                    Some(Err(err)) => {
                        warn!(error = %err, "sqlite3 stderr unreadable");
                        self.stderr_open = false;
                    }
                    None => self.stderr_open = false,
                },
                frame = self.stdout.next() => match frame {
                    Some(Ok(text)) => {
                        self.collect_pending_stderr(&mut error_text);
                        return match error_text {
                            Some(message) => {
                                let message = failure_message(&message);
                                debug!(kind = %kind, stderr = %message, "statement failed");
                                let _ = respond_to.send(Err(SqliteCliError::ExecutionError(message)));
                                Exchange::Failed
                            }
                            None => {
                                let _ = respond_to.send(shape_output(&text, kind));
                                Exchange::Completed
                            }
                        };
                    }
                    Some(Err(err)) => {
                        let _ = respond_to.send(Err(err));
                        return Exchange::Died;
                    }
                    None => {
                        self.collect_pending_stderr(&mut error_text);
                        let status = match self.child.wait().await {
                            Ok(status) => status.to_string(),
                            Err(err) => err.to_string(),
                        };
                        warn!(%status, "sqlite3 exited while a statement was in flight");
                        let message = match error_text {
                            Some(message) if !message.trim().is_empty() => format!(
                                "sqlite3 exited ({status}) before completing the statement: {}",
                                message.trim()
                            ),
                            _ => format!("sqlite3 exited ({status}) before completing the statement"),
                        };
                        let _ = respond_to.send(Err(SqliteCliError::ExecutionError(message)));
                        return Exchange::Died;
                    }
                },
            }
        }
    }

    /// Pick up stderr that is already readable when the response frame completes.
    fn collect_pending_stderr(&mut self, error_text: &mut Option<String>) {
        while self.stderr_open {
            match self.stderr.next().now_or_never() {
                Some(Some(Ok(bytes))) => error_text
                    .get_or_insert_with(String::new)
                    .push_str(&String::from_utf8_lossy(&bytes)),
                Some(Some(Err(_)) | None) => self.stderr_open = false,
                None => break,
            }
        }
    }

    /// Send `.quit`, close standard input, and wait for the process to exit.
    pub(super) async fn shutdown(self) -> Result<(), SqliteCliError> {
        let Self {
            mut child, stdin, ..
        } = self;
        let mut stdin = stdin.into_inner();
        if let Err(err) = stdin.write_all(b".quit\n").await {
            debug!(error = %err, "sqlite3 stdin already closed");
        }
        drop(stdin);

        match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(%status, "sqlite3 session exited");
                Ok(())
            }
            Err(_) => {
                warn!("sqlite3 session ignored .quit; killing it");
                child.kill().await?;
                Ok(())
            }
        }
    }
}
