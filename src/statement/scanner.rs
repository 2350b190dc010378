#[derive(Clone, Copy)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Bracketed,
    Backticked,
    LineComment,
    BlockComment,
}

fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

fn is_placeholder(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'{') && bytes.get(idx + 1) == Some(&b'}')
}

/// How a piece of SQL text ends, as seen by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Tail {
    Closed,
    /// Inside a `--` comment; anything appended on the same line is commented out.
    LineComment,
    /// Inside a literal, quoted identifier, or block comment that never closes.
    Open(&'static str),
}

/// Walk `source`, calling `on_placeholder` with the byte offset of each `{}` found outside
/// literals, quoted identifiers, and comments. SQLite block comments do not nest.
fn scan(source: &str, mut on_placeholder: impl FnMut(usize)) -> State {
    let bytes = source.as_bytes();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                b'[' => state = State::Bracketed,
                b'`' => state = State::Backticked,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment;
                    idx += 1;
                }
                _ if is_placeholder(bytes, idx) => {
                    on_placeholder(idx);
                    idx += 2;
                    continue;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::Bracketed => {
                if b == b']' {
                    state = State::Normal;
                }
            }
            State::Backticked => {
                if b == b'`' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if is_block_comment_end(bytes, idx) {
                    state = State::Normal;
                    idx += 1;
                }
            }
        }
        idx += 1;
    }
    state
}

/// Split `source` into the literal parts around each `{}` placeholder.
///
/// Placeholders inside string literals, quoted identifiers, and comments are left alone, so
/// `json('{}')` stays literal text.
pub(super) fn split_placeholders(source: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut part_start = 0;
    scan(source, |idx| {
        // `{` and `}` are ASCII, so both slice points are char boundaries.
        parts.push(source[part_start..idx].to_owned());
        part_start = idx + 2;
    });
    parts.push(source[part_start..].to_owned());
    parts
}

/// Classify the end of a built statement.
pub(super) fn tail(source: &str) -> Tail {
    match scan(source, |_| {}) {
        State::Normal => Tail::Closed,
        State::LineComment => Tail::LineComment,
        State::SingleQuoted => Tail::Open("string literal"),
        State::DoubleQuoted => Tail::Open("quoted identifier"),
        State::Bracketed => Tail::Open("bracketed identifier"),
        State::Backticked => Tail::Open("backtick identifier"),
        State::BlockComment => Tail::Open("block comment"),
    }
}
