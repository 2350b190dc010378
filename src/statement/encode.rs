use std::fmt::Write as _;

use chrono::SecondsFormat;

use crate::error::SqliteCliError;
use crate::types::SqlValue;

/// Render a single value as SQL literal text.
///
/// # Errors
/// Returns `SqliteCliError::InvalidNumber` for NaN/infinite floats and
/// `SqliteCliError::IncompatibleValue` for values with no literal form (an empty list).
pub fn encode(value: &SqlValue) -> Result<String, SqliteCliError> {
    let mut out = String::new();
    encode_into(value, &mut out)?;
    Ok(out)
}

pub(crate) fn encode_into(value: &SqlValue, out: &mut String) -> Result<(), SqliteCliError> {
    match value {
        SqlValue::Text(text) => push_quoted(text, out),
        SqlValue::Int(i) => {
            let _ = write!(out, "{i}");
        }
        SqlValue::Float(f) => {
            if !f.is_finite() {
                return Err(SqliteCliError::InvalidNumber(*f));
            }
            let _ = write!(out, "{f}");
        }
        SqlValue::Bool(b) => out.push(if *b { '1' } else { '0' }),
        SqlValue::Null => out.push_str("NULL"),
        SqlValue::Timestamp(ts) => {
            push_quoted(&ts.to_rfc3339_opts(SecondsFormat::Millis, true), out);
        }
        SqlValue::Blob(bytes) => {
            out.reserve(bytes.len() * 2 + 3);
            out.push_str("x'");
            for byte in bytes {
                let _ = write!(out, "{byte:02x}");
            }
            out.push('\'');
        }
        SqlValue::Raw(raw) => out.push_str(raw.as_str()),
        SqlValue::List(items) => {
            if items.is_empty() {
                return Err(SqliteCliError::IncompatibleValue("empty list".into()));
            }
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                encode_into(item, out)?;
            }
        }
    }
    Ok(())
}

fn push_quoted(text: &str, out: &mut String) {
    out.reserve(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawSql;
    use chrono::{TimeZone, Utc};

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(encode(&"it's".into()).unwrap(), "'it''s'");
        assert_eq!(encode(&"''".into()).unwrap(), "''''''");
        assert_eq!(encode(&"¥ · £ · €".into()).unwrap(), "'¥ · £ · €'");
    }

    #[test]
    fn numbers_and_booleans() {
        assert_eq!(encode(&SqlValue::Int(-42)).unwrap(), "-42");
        assert_eq!(encode(&SqlValue::Float(1.5)).unwrap(), "1.5");
        assert_eq!(encode(&SqlValue::Bool(true)).unwrap(), "1");
        assert_eq!(encode(&SqlValue::Bool(false)).unwrap(), "0");
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = encode(&SqlValue::Float(value)).unwrap_err();
            assert!(matches!(err, SqliteCliError::InvalidNumber(_)));
        }
    }

    #[test]
    fn null_timestamp_and_blob() {
        assert_eq!(encode(&SqlValue::Null).unwrap(), "NULL");

        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            encode(&SqlValue::Timestamp(ts)).unwrap(),
            "'2024-01-02T03:04:05.000Z'"
        );

        let blob = SqlValue::Blob(vec![0x00, 0x0f, 0xab, 0xff]);
        assert_eq!(encode(&blob).unwrap(), "x'000fabff'");
        assert_eq!(encode(&SqlValue::Blob(Vec::new())).unwrap(), "x''");
    }

    #[test]
    fn blob_hex_decodes_back_to_the_same_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        let literal = encode(&SqlValue::Blob(bytes.clone())).unwrap();
        let hex = &literal[2..literal.len() - 1];
        let decoded: Vec<u8> = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
            .collect();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn raw_is_verbatim_and_lists_expand() {
        assert_eq!(encode(&RawSql::new("\"lorem\"").into()).unwrap(), "\"lorem\"");
        assert_eq!(encode(&vec!["a", "b"].into()).unwrap(), "'a','b'");
        let err = encode(&SqlValue::List(Vec::new())).unwrap_err();
        assert!(matches!(err, SqliteCliError::IncompatibleValue(_)));
        let err = encode(&SqlValue::list([f64::NAN])).unwrap_err();
        assert!(matches!(err, SqliteCliError::InvalidNumber(_)));
    }
}
