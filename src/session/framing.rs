use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;
use uuid::Uuid;

use crate::error::SqliteCliError;

const SENTINEL_COLUMN: &str = "sentinel";

/// Delimits responses on the shell's standard output with a per-session marker row.
///
/// Every request is followed by `SELECT '<marker>' AS sentinel;`, which `sqlite3 -json`
/// prints as `[{"sentinel":"<marker>"}]` on its own line. A response is complete once the
/// accumulated output ends in that line.
#[derive(Debug, Clone)]
pub(crate) struct SentinelCodec {
    probe: String,
    line: Vec<u8>,
}

impl SentinelCodec {
    pub(crate) fn new(marker: Uuid) -> Self {
        Self {
            probe: format!("SELECT '{marker}' AS {SENTINEL_COLUMN};"),
            line: format!("[{{\"{SENTINEL_COLUMN}\":\"{marker}\"}}]\n").into_bytes(),
        }
    }

    /// Remove every trailing, then every leading, copy of the sentinel line.
    fn strip<'a>(&self, mut body: &'a [u8]) -> &'a [u8] {
        let n = self.line.len();
        while body.ends_with(&self.line) {
            body = &body[..body.len() - n];
        }
        while body.starts_with(&self.line) {
            body = &body[n..];
        }
        body
    }
}

impl Decoder for SentinelCodec {
    type Item = String;
    type Error = SqliteCliError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.ends_with(&self.line) {
            return Ok(None);
        }
        let frame = src.split();
        let body = self.strip(&frame);
        trace!(bytes = body.len(), "sentinel observed");
        Ok(Some(String::from_utf8_lossy(body).into_owned()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() {
            trace!(bytes = src.len(), "discarding unterminated output at eof");
            src.clear();
        }
        Ok(None)
    }
}

impl<'a> Encoder<&'a str> for SentinelCodec {
    type Error = SqliteCliError;

    /// The statement gets its own line and terminator so a trailing `--` comment or a missing
    /// `;` cannot swallow the probe.
    fn encode(&mut self, statement: &'a str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(statement.len() + self.probe.len() + 4);
        dst.put_slice(statement.as_bytes());
        dst.put_slice(b"\n;\n");
        dst.put_slice(self.probe.as_bytes());
        dst.put_u8(b'\n');
        Ok(())
    }
}
