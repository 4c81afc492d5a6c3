//! Splitting SQL scripts into statements.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Split a script on `;` into trimmed, non-empty statements.
///
/// Semicolons inside quoted strings or identifiers (`'`, `"`, `` ` ``, where
/// a doubled quote is an escaped one), `--` line comments and `/* */` block
/// comments do not end a statement. Comments are kept in the output.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut state = State::Code;
    let mut chars = script.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);
        state = match (state, ch) {
            (State::Code, '\'' | '"' | '`') => State::Quoted(ch),
            (State::Code, '-') if next == Some('-') => {
                chars.next();
                State::LineComment
            }
            (State::Code, '/') if next == Some('*') => {
                chars.next();
                State::BlockComment
            }
            (State::Code, ';') => {
                push_trimmed(&mut statements, &script[start..i]);
                start = i + ch.len_utf8();
                State::Code
            }
            (State::Quoted(q), c) if c == q => {
                if next == Some(q) {
                    chars.next();
                    state
                } else {
                    State::Code
                }
            }
            (State::LineComment, '\n') => State::Code,
            (State::BlockComment, '*') if next == Some('/') => {
                chars.next();
                State::Code
            }
            (state, _) => state,
        };
    }
    push_trimmed(&mut statements, &script[start..]);

    statements
}

fn push_trimmed(statements: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        statements.push(piece.to_string());
    }
}
