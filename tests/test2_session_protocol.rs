#![cfg(unix)]
//! Persistent-session framing against a scripted stand-in for the sqlite3 shell.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::FakeShell;
use futures_util::future::join_all;
use sqlite_cli_middleware::prelude::*;

#[tokio::test]
async fn raw_and_structured_calls_share_one_session() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;

    assert_eq!(db.query("hello").await?, r#"[{"echo":"hello"}]"#);

    let rows = db.all("rows please").await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["echo"], "rows please");

    // `get` rewrites a bare SELECT before it reaches the process.
    let row = db.get("SELECT x").await?.expect("one row");
    assert_eq!(row["echo"], "SELECT x LIMIT 1");

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn concurrent_calls_complete_in_submission_order() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;
    let completed = Arc::new(Mutex::new(Vec::new()));

    let calls = (0..20).map(|i| {
        let db = db.clone();
        let completed = Arc::clone(&completed);
        async move {
            let statement = if i % 3 == 0 {
                format!("SLOW item {i}")
            } else {
                format!("item {i}")
            };
            let out = db.query(statement.as_str()).await;
            completed.lock().unwrap().push(i);
            (statement, out)
        }
    });

    for (statement, out) in join_all(calls).await {
        assert_eq!(out?, format!(r#"[{{"echo":"{statement}"}}]"#));
    }
    let order = completed.lock().unwrap().clone();
    assert_eq!(order, (0..20).collect::<Vec<_>>());

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn errors_fail_only_the_call_that_caused_them() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;

    let (before, failed, after) = tokio::join!(
        db.query("before"),
        db.query("FAIL here"),
        db.query("after"),
    );

    assert_eq!(before?, r#"[{"echo":"before"}]"#);
    match failed {
        Err(SqliteCliError::ExecutionError(message)) => assert!(message.contains("syntax error")),
        other => panic!("expected execution error, got {other:?}"),
    }
    assert_eq!(after?, r#"[{"echo":"after"}]"#);

    // The session keeps serving calls after an error.
    assert_eq!(db.query("still alive").await?, r#"[{"echo":"still alive"}]"#);
    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn error_text_split_across_reads_is_reported_whole() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;

    let (failed, after) = tokio::join!(db.query("SPLIT error"), db.query("after"));
    match failed {
        Err(SqliteCliError::ExecutionError(message)) => {
            assert_eq!(message, r#"Error: near "SPLIT": syntax error"#);
        }
        other => panic!("expected execution error, got {other:?}"),
    }
    assert_eq!(after?, r#"[{"echo":"after"}]"#);

    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn unterminated_statements_never_reach_the_process() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;

    for sql in ["SELECT 'abc", "SELECT \"abc", "SELECT [abc", "SELECT 1 /* abc"] {
        let err = tokio::time::timeout(Duration::from_secs(3), db.query(sql))
            .await
            .expect("call returned")
            .unwrap_err();
        assert!(
            matches!(err, SqliteCliError::UnterminatedStatement(_)),
            "{sql}: {err:?}"
        );
    }

    // The session is still usable afterwards.
    assert_eq!(db.query("next").await?, r#"[{"echo":"next"}]"#);
    db.close().await?;
    assert_eq!(shell.log(), vec!["next".to_owned(), ".quit".to_owned()]);
    Ok(())
}

#[tokio::test]
async fn failed_batch_is_rolled_back_before_the_next_call() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;

    let mut tx = db.transaction();
    tx.append("INSERT ok").append("FAIL insert");
    let err = tx.commit().await.unwrap_err();
    assert!(matches!(err, SqliteCliError::ExecutionError(_)));

    assert_eq!(db.query("next").await?, r#"[{"echo":"next"}]"#);
    db.close().await?;

    let log = shell.log();
    let batch = log
        .iter()
        .position(|line| line.starts_with("BEGIN TRANSACTION;INSERT ok;FAIL insert;COMMIT"))
        .expect("batch was sent");
    assert_eq!(log.get(batch + 1).map(String::as_str), Some("ROLLBACK"));
    assert_eq!(log.get(batch + 2).map(String::as_str), Some("next"));
    Ok(())
}

#[tokio::test]
async fn close_honors_queued_calls_and_rejects_new_ones() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;

    let (queued, closed) = tokio::join!(db.query("SLOW queued"), db.close());
    assert_eq!(queued?, r#"[{"echo":"SLOW queued"}]"#);
    closed?;

    let err = db.query("too late").await.unwrap_err();
    assert!(matches!(err, SqliteCliError::ChannelClosed));
    assert_eq!(err.code(), "SQLITE_MISUSE");

    // Second close is a no-op.
    db.close().await?;
    assert_eq!(shell.log().last().map(String::as_str), Some(".quit"));
    Ok(())
}

#[tokio::test]
async fn process_exit_mid_call_does_not_hang() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;

    let err = db.query("DIE now").await.unwrap_err();
    match err {
        SqliteCliError::ExecutionError(message) => assert!(message.contains("exited")),
        other => panic!("expected execution error, got {other:?}"),
    }

    let err = db.query("after death").await.unwrap_err();
    assert!(matches!(err, SqliteCliError::ConnectionError(_)));
    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn dropping_every_handle_ends_the_session() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;
    db.query("one").await?;
    drop(db);

    for _ in 0..100 {
        if shell.log().last().map(String::as_str) == Some(".quit") {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session did not shut down after its handles were dropped");
}

#[tokio::test]
async fn build_errors_never_reach_the_process() -> Result<(), SqliteCliError> {
    let shell = FakeShell::new();
    let db = SqliteCli::new(shell.options()).await?;

    let err = db
        .query(Template::new("SELECT ").value(f64::INFINITY))
        .await
        .unwrap_err();
    assert!(matches!(err, SqliteCliError::InvalidNumber(_)));
    let err = db.query("   ").await.unwrap_err();
    assert!(matches!(err, SqliteCliError::EmptyQuery));

    db.close().await?;
    assert_eq!(shell.log(), vec![".quit".to_owned()]);
    Ok(())
}
