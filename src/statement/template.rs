use crate::error::SqliteCliError;
use crate::types::{RawSql, SqlValue};

use super::encode::encode_into;
use super::scanner::split_placeholders;
use super::Statement;

/// A statement template: literal SQL parts interleaved with values.
///
/// `parts.len()` is always `values.len() + 1` for a well-formed template; a mismatch is
/// reported when the template is built, never silently padded.
///
/// ```rust
/// use sqlite_cli_middleware::prelude::*;
///
/// let template = Template::new("SELECT * FROM lorem WHERE info = ")
///     .value("Ipsum 5")
///     .sql(" AND rowid > ")
///     .value(2);
/// assert_eq!(
///     template.build().unwrap().as_str(),
///     "SELECT * FROM lorem WHERE info = 'Ipsum 5' AND rowid > 2"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    parts: Vec<String>,
    values: Vec<SqlValue>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            parts: vec![String::new()],
            values: Vec::new(),
        }
    }
}

impl Template {
    /// Template with a single literal part and no values.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            parts: vec![sql.into()],
            values: Vec::new(),
        }
    }

    /// Template from explicit parts and values.
    #[must_use]
    pub fn from_parts(parts: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { parts, values }
    }

    /// Split `source` on `{}` placeholders and pair them with `values`.
    ///
    /// Used by the [`crate::sql!`] and [`crate::raw!`] macros.
    #[must_use]
    pub fn parse(source: &str, values: Vec<SqlValue>) -> Self {
        Self {
            parts: split_placeholders(source),
            values,
        }
    }

    /// Append literal SQL to the current part.
    #[must_use]
    pub fn sql(mut self, text: &str) -> Self {
        match self.parts.last_mut() {
            Some(last) => last.push_str(text),
            None => self.parts.push(text.to_owned()),
        }
        self
    }

    /// Append a value, starting a new literal part after it.
    #[must_use]
    pub fn value(mut self, value: impl Into<SqlValue>) -> Self {
        if self.parts.is_empty() {
            self.parts.push(String::new());
        }
        self.values.push(value.into());
        self.parts.push(String::new());
        self
    }

    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    fn check_arity(&self) -> Result<(), SqliteCliError> {
        if self.parts.len() == self.values.len() + 1 {
            Ok(())
        } else {
            Err(SqliteCliError::ParameterError(format!(
                "template has {} placeholder(s) but {} value(s)",
                self.parts.len().saturating_sub(1),
                self.values.len()
            )))
        }
    }

    /// Encode every value into the template and return the trimmed statement.
    ///
    /// # Errors
    /// Fails without returning partial text if any value cannot be encoded, if the number of
    /// placeholders and values differ, or if the result is empty.
    pub fn build(&self) -> Result<Statement, SqliteCliError> {
        self.check_arity()?;
        let mut out = String::with_capacity(self.parts.iter().map(String::len).sum());
        out.push_str(&self.parts[0]);
        for (value, part) in self.values.iter().zip(&self.parts[1..]) {
            encode_into(value, &mut out)?;
            out.push_str(part);
        }
        Statement::new(out)
    }

    /// Concatenate the template into a pre-escaped fragment without quoting text values.
    ///
    /// Text and raw values are inserted verbatim; other values use their literal form, so a
    /// nested raw fragment is never escaped twice.
    ///
    /// # Errors
    /// Returns a parameter error on a placeholder/value mismatch, or the encoder's error for
    /// non-text values without a literal form.
    pub fn into_raw(self) -> Result<RawSql, SqliteCliError> {
        self.check_arity()?;
        let mut parts = self.parts.into_iter();
        let mut out = parts.next().unwrap_or_default();
        for (value, part) in self.values.iter().zip(parts) {
            push_plain(value, &mut out)?;
            out.push_str(&part);
        }
        Ok(RawSql::new(out))
    }
}

fn push_plain(value: &SqlValue, out: &mut String) -> Result<(), SqliteCliError> {
    match value {
        SqlValue::Text(text) => out.push_str(text),
        SqlValue::Raw(raw) => out.push_str(raw.as_str()),
        SqlValue::List(items) => {
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                push_plain(item, out)?;
            }
        }
        other => encode_into(other, out)?,
    }
    Ok(())
}

impl From<&str> for Template {
    fn from(sql: &str) -> Self {
        Template::new(sql)
    }
}

impl From<String> for Template {
    fn from(sql: String) -> Self {
        Template::new(sql)
    }
}

impl From<&String> for Template {
    fn from(sql: &String) -> Self {
        Template::new(sql.clone())
    }
}

/// Build a [`Template`] from a literal with `{}` placeholders and the values to bind.
///
/// ```rust
/// use sqlite_cli_middleware::sql;
///
/// let statement = sql!("SELECT * FROM lorem WHERE info IN ({})", vec!["a", "b"])
///     .build()
///     .unwrap();
/// assert_eq!(statement.as_str(), "SELECT * FROM lorem WHERE info IN ('a','b')");
/// ```
#[macro_export]
macro_rules! sql {
    ($source:expr $(, $value:expr)* $(,)?) => {
        $crate::Template::parse($source, vec![$($crate::SqlValue::from($value)),*])
    };
}

/// Build a pre-escaped [`RawSql`] fragment; bound text is inserted without quoting.
///
/// ```rust
/// use sqlite_cli_middleware::{raw, sql};
///
/// let table = "lorem";
/// let statement = sql!("SELECT * FROM {}", raw!("{}", table).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(statement.as_str(), "SELECT * FROM lorem");
/// ```
#[macro_export]
macro_rules! raw {
    ($source:expr $(, $value:expr)* $(,)?) => {
        $crate::Template::parse($source, vec![$($crate::SqlValue::from($value)),*]).into_raw()
    };
}
