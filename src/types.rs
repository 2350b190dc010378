use std::fmt;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::SqliteCliError;

/// A decoded result row: column name to JSON value, as printed by `sqlite3 -json`.
pub type Row = serde_json::Map<String, JsonValue>;

/// Values that can be bound into a statement template.
///
/// Host types convert at the call boundary, so the encoder only ever sees this closed set:
/// ```rust
/// use sqlite_cli_middleware::prelude::*;
///
/// let values = vec![
///     SqlValue::from(1),
///     SqlValue::from("alice"),
///     SqlValue::from(Option::<String>::None),
///     SqlValue::from(vec!["a", "b"]),
/// ];
/// # let _ = values;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Text, emitted single-quoted
    Text(String),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value; must be finite to encode
    Float(f64),
    /// Boolean, emitted as `0`/`1`
    Bool(bool),
    /// NULL value
    Null,
    /// UTC instant, emitted as quoted ISO-8601
    Timestamp(DateTime<Utc>),
    /// Binary data, emitted as a blob literal
    Blob(Vec<u8>),
    /// Pre-escaped SQL, emitted verbatim
    Raw(RawSql),
    /// Comma-separated list of values, for `IN (...)` clauses
    List(Vec<SqlValue>),
}

impl SqlValue {
    /// Build a list value from anything convertible element-wise.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SqlValue>,
    {
        SqlValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// SQL text that is already safe to embed, such as an identifier or a trusted fragment.
///
/// Values of this type are never escaped again, including when nested inside another raw
/// fragment. Build them with [`crate::SqliteCli::raw`] or the [`crate::raw!`] macro.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawSql(String);

impl RawSql {
    /// Mark `text` as pre-escaped. The caller vouches for its safety.
    pub fn new(text: impl Into<String>) -> Self {
        RawSql(text.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What shape the caller wants back from a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Raw text output
    Query,
    /// First decoded row, or nothing
    Get,
    /// Every decoded row
    All,
    /// A `BEGIN ... COMMIT` batch; raw text output
    Batch,
}

impl CallKind {
    /// Whether the output is decoded as JSON rows.
    #[must_use]
    pub fn is_structured(self) -> bool {
        matches!(self, CallKind::Get | CallKind::All)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CallKind::Query => "query",
            CallKind::Get => "get",
            CallKind::All => "all",
            CallKind::Batch => "batch",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float(f64::from(value))
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_owned())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

/// Naive timestamps are taken to be UTC.
impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value.and_utc())
    }
}

impl From<SystemTime> for SqlValue {
    fn from(value: SystemTime) -> Self {
        SqlValue::Timestamp(DateTime::<Utc>::from(value))
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        SqlValue::Blob(value.to_vec())
    }
}

impl From<RawSql> for SqlValue {
    fn from(value: RawSql) -> Self {
        SqlValue::Raw(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

impl From<Vec<SqlValue>> for SqlValue {
    fn from(value: Vec<SqlValue>) -> Self {
        SqlValue::List(value)
    }
}

impl From<Vec<String>> for SqlValue {
    fn from(value: Vec<String>) -> Self {
        SqlValue::list(value)
    }
}

impl From<Vec<&str>> for SqlValue {
    fn from(value: Vec<&str>) -> Self {
        SqlValue::list(value)
    }
}

impl From<Vec<i64>> for SqlValue {
    fn from(value: Vec<i64>) -> Self {
        SqlValue::list(value)
    }
}

impl<T: Into<SqlValue>, const N: usize> From<[T; N]> for SqlValue {
    fn from(value: [T; N]) -> Self {
        SqlValue::list(value)
    }
}

/// JSON objects have no literal form and are rejected; arrays become lists.
impl TryFrom<JsonValue> for SqlValue {
    type Error = SqliteCliError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Null => Ok(SqlValue::Null),
            JsonValue::Bool(b) => Ok(SqlValue::Bool(b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(SqlValue::Int(i))
                } else {
                    n.as_f64().map(SqlValue::Float).ok_or_else(|| {
                        SqliteCliError::IncompatibleValue(format!("unrepresentable number {n}"))
                    })
                }
            }
            JsonValue::String(s) => Ok(SqlValue::Text(s)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(SqlValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(SqlValue::List),
            JsonValue::Object(_) => Err(SqliteCliError::IncompatibleValue("object".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_map_none_to_null() {
        assert_eq!(SqlValue::from(Option::<i32>::None), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".into()));
    }

    #[test]
    fn byte_vectors_are_blobs_and_string_vectors_are_lists() {
        assert_eq!(SqlValue::from(vec![1u8, 2]), SqlValue::Blob(vec![1, 2]));
        assert_eq!(
            SqlValue::from(vec!["a", "b"]),
            SqlValue::List(vec![SqlValue::Text("a".into()), SqlValue::Text("b".into())])
        );
    }

    #[test]
    fn json_objects_are_rejected() {
        let err = SqlValue::try_from(json!({"no": "pe"})).unwrap_err();
        assert!(matches!(err, SqliteCliError::IncompatibleValue(_)));

        let list = SqlValue::try_from(json!([1, "two", null, 2.5])).unwrap();
        assert_eq!(
            list,
            SqlValue::List(vec![
                SqlValue::Int(1),
                SqlValue::Text("two".into()),
                SqlValue::Null,
                SqlValue::Float(2.5),
            ])
        );
    }
}
