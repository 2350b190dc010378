// Statement construction: value encoding, placeholder templates, and the
// resulting executable `Statement`.
//
// - encode: SQL literal rendering for `SqlValue`
// - scanner: `{}` placeholder splitting that skips literals and comments
// - template: `Template`, `sql!`, `raw!`

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SqliteCliError;

use scanner::Tail;

mod encode;
mod scanner;
mod template;

pub use encode::encode;
pub use template::Template;

static SELECT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^SELECT\s+").expect("static regex"));
static TRAILING_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+LIMIT\s+\d+$").expect("static regex"));

/// A fully-resolved, non-empty SQL statement ready for an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement(String);

impl Statement {
    pub(crate) fn new(text: String) -> Result<Self, SqliteCliError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SqliteCliError::EmptyQuery);
        }
        // An open literal would swallow whatever the executor writes after the statement.
        if let Tail::Open(construct) = scanner::tail(trimmed) {
            return Err(SqliteCliError::UnterminatedStatement(construct));
        }
        if trimmed.len() == text.len() {
            Ok(Statement(text))
        } else {
            Ok(Statement(trimmed.to_owned()))
        }
    }

    /// Wrap already-built statements as one `BEGIN TRANSACTION; ...; COMMIT` unit.
    pub(crate) fn transaction(statements: &[Statement]) -> Self {
        let mut out = String::from("BEGIN TRANSACTION");
        let mut in_line_comment = false;
        for statement in statements {
            out.push_str(if in_line_comment { "\n;" } else { ";" });
            out.push_str(&statement.0);
            in_line_comment = scanner::tail(&statement.0) == Tail::LineComment;
        }
        out.push_str(if in_line_comment { "\n;COMMIT" } else { ";COMMIT" });
        Statement(out)
    }

    /// Append ` LIMIT 1` to a `SELECT` that does not end in its own numeric limit.
    ///
    /// Trailing semicolons are dropped first so the clause lands inside the statement.
    #[must_use]
    pub fn limit_single_row(mut self) -> Self {
        let body = self
            .0
            .trim_end_matches(|c: char| c == ';' || c.is_whitespace());
        if SELECT_PREFIX.is_match(body) && !TRAILING_LIMIT.is_match(body) {
            let len = body.len();
            self.0.truncate(len);
            self.0.push_str(" LIMIT 1");
        }
        self
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Statement {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
