use serde_json::Value as JsonValue;

use crate::error::SqliteCliError;
use crate::types::{CallKind, Row};

/// Result of running one statement, shaped by its [`CallKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Trimmed output text (`query` and `batch` calls)
    Text(String),
    /// First row, if any (`get` calls)
    Row(Option<Row>),
    /// All rows (`all` calls)
    Rows(Vec<Row>),
}

impl QueryOutput {
    /// # Errors
    /// Returns `SqliteCliError::ExecutionError` if the executor produced a different shape.
    pub fn into_text(self) -> Result<String, SqliteCliError> {
        match self {
            QueryOutput::Text(text) => Ok(text),
            other => Err(shape_mismatch("text", &other)),
        }
    }

    /// # Errors
    /// Returns `SqliteCliError::ExecutionError` if the executor produced a different shape.
    pub fn into_row(self) -> Result<Option<Row>, SqliteCliError> {
        match self {
            QueryOutput::Row(row) => Ok(row),
            QueryOutput::Rows(rows) => Ok(rows.into_iter().next()),
            other => Err(shape_mismatch("row", &other)),
        }
    }

    /// # Errors
    /// Returns `SqliteCliError::ExecutionError` if the executor produced a different shape.
    pub fn into_rows(self) -> Result<Vec<Row>, SqliteCliError> {
        match self {
            QueryOutput::Rows(rows) => Ok(rows),
            other => Err(shape_mismatch("rows", &other)),
        }
    }
}

fn shape_mismatch(expected: &str, got: &QueryOutput) -> SqliteCliError {
    let got = match got {
        QueryOutput::Text(_) => "text",
        QueryOutput::Row(_) => "row",
        QueryOutput::Rows(_) => "rows",
    };
    SqliteCliError::ExecutionError(format!("executor returned {got}, expected {expected}"))
}

/// Shape raw `sqlite3` output for `kind`. Raw kinds never touch the JSON decoder.
///
/// # Errors
/// Returns `SqliteCliError::Json` if structured output is not a JSON array of row objects.
pub fn shape_output(text: &str, kind: CallKind) -> Result<QueryOutput, SqliteCliError> {
    let text = text.trim();
    if !kind.is_structured() {
        return Ok(QueryOutput::Text(text.to_owned()));
    }
    let rows = decode_rows(text)?;
    Ok(match kind {
        CallKind::Get => QueryOutput::Row(rows.into_iter().next()),
        _ => QueryOutput::Rows(rows),
    })
}

/// `sqlite3 -json` prints one array per result-producing statement and nothing for an empty
/// result, so empty text is zero rows and consecutive arrays are concatenated.
fn decode_rows(text: &str) -> Result<Vec<Row>, SqliteCliError> {
    let mut rows = Vec::new();
    for value in serde_json::Deserializer::from_str(text).into_iter::<JsonValue>() {
        match value? {
            JsonValue::Array(items) => {
                for item in items {
                    match item {
                        JsonValue::Object(row) => rows.push(row),
                        other => {
                            return Err(SqliteCliError::ExecutionError(format!(
                                "expected a row object, got {other}"
                            )));
                        }
                    }
                }
            }
            other => {
                return Err(SqliteCliError::ExecutionError(format!(
                    "expected an array of rows, got {other}"
                )));
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_kinds_return_trimmed_text() {
        let out = shape_output("  [{\"1\":1}]\n", CallKind::Query).unwrap();
        assert_eq!(out, QueryOutput::Text("[{\"1\":1}]".into()));
        let out = shape_output("not json at all", CallKind::Batch).unwrap();
        assert_eq!(out.into_text().unwrap(), "not json at all");
    }

    #[test]
    fn empty_output_is_no_rows() {
        assert_eq!(shape_output("", CallKind::All).unwrap(), QueryOutput::Rows(vec![]));
        assert_eq!(shape_output("\n", CallKind::Get).unwrap(), QueryOutput::Row(None));
    }

    #[test]
    fn get_returns_the_first_row_only() {
        let text = "[{\"id\":1,\"info\":\"a\"},\n{\"id\":2,\"info\":\"b\"}]\n";
        let row = shape_output(text, CallKind::Get).unwrap().into_row().unwrap();
        assert_eq!(row.unwrap().get("id"), Some(&json!(1)));

        let rows = shape_output(text, CallKind::All).unwrap().into_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("info"), Some(&json!("b")));
    }

    #[test]
    fn consecutive_result_arrays_are_concatenated() {
        let rows = shape_output("[{\"a\":1}]\n[{\"a\":2}]\n", CallKind::All)
            .unwrap()
            .into_rows()
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn malformed_structured_output_is_an_error() {
        assert!(shape_output("Error: nope", CallKind::All).is_err());
        assert!(shape_output("[1, 2]", CallKind::All).is_err());
        assert!(QueryOutput::Text(String::new()).into_rows().is_err());
    }
}
