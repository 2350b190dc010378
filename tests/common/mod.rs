#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

/// Whether a real `sqlite3` binary is on PATH; tests that need one skip otherwise.
pub fn sqlite3_available() -> bool {
    let found = Command::new("sqlite3")
        .arg("-version")
        .output()
        .is_ok_and(|out| out.status.success());
    if !found {
        eprintln!("sqlite3 not found on PATH; skipping");
    }
    found
}

/// Minimal stand-in for the interactive shell, driven through `sh <script> -json`.
///
/// - the sentinel probe prints the marker row
/// - `;` on its own line is ignored
/// - lines containing `FAIL` print an error to stderr
/// - `SPLIT <text>` prints its error in two writes with a pause between them
/// - `DIE` exits with status 3 mid-call
/// - `SLOW <text>` echoes after a short delay
/// - anything else is echoed back as `[{"echo":"<line>"}]`
///
/// Every non-probe line is appended to `<script>.log`.
const FAKE_SHELL: &str = r#"log="$0.log"
: > "$log"
while IFS= read -r line; do
  case "$line" in
    "SELECT '"*"' AS sentinel;")
      id=${line#"SELECT '"}
      id=${id%%"'"*}
      printf '[{"sentinel":"%s"}]\n' "$id"
      ;;
    ";")
      ;;
    .quit)
      echo ".quit" >> "$log"
      exit 0
      ;;
    DIE*)
      exit 3
      ;;
    SPLIT*)
      echo "$line" >> "$log"
      printf 'Error: near "SPLIT": ' >&2
      sleep 0.05
      printf 'syntax error\n' >&2
      ;;
    *FAIL*)
      echo "$line" >> "$log"
      echo "Error: near \"FAIL\": syntax error" >&2
      sleep 0.1
      ;;
    SLOW*)
      echo "$line" >> "$log"
      sleep 0.05
      printf '[{"echo":"%s"}]\n' "$line"
      ;;
    *)
      echo "$line" >> "$log"
      printf '[{"echo":"%s"}]\n' "$line"
      ;;
  esac
done
"#;

pub struct FakeShell {
    _dir: tempfile::TempDir,
    script: PathBuf,
}

impl FakeShell {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("fake-sqlite3.sh");
        std::fs::write(&script, FAKE_SHELL).expect("write fake shell");
        Self { _dir: dir, script }
    }

    /// Options that run the fake script as the "database" argument of `sh`.
    pub fn options(&self) -> sqlite_cli_middleware::SqliteOptions {
        sqlite_cli_middleware::SqliteOptionsBuilder::new(self.script.to_string_lossy().into_owned())
            .bin("sh")
            .persistent(true)
            .finish()
    }

    pub fn log(&self) -> Vec<String> {
        let path = log_path(&self.script);
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

fn log_path(script: &Path) -> PathBuf {
    let mut path = script.as_os_str().to_owned();
    path.push(".log");
    PathBuf::from(path)
}

/// Fresh database file path inside a temp dir kept alive by the returned guard.
pub fn temp_db() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("test.db").to_string_lossy().into_owned();
    (dir, path)
}
