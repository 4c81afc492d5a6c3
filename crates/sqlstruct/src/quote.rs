//! SQL identifier quoting.
//!
//! A [`Quoter`] joins identifier parts (schema, table, column) with `.`,
//! quoting each part according to a dialect rule.
//!
//! # Example
//! ```ignore
//! use sqlstruct::quote::{quote_ansi, quote_required_backticks};
//!
//! assert_eq!(quote_ansi(&["users", "id"]), r#""users"."id""#);
//! assert_eq!(quote_required_backticks(&["users", "first name"]), "users.`first name`");
//! ```

use crate::error::{SqlError, SqlResult};

/// Formats table and column names.
pub type Quoter = fn(&[&str]) -> String;

/// Joins parts with `.` without escaping.
pub fn quote_noop(parts: &[&str]) -> String {
    parts.join(".")
}

/// Wraps each part in double quotes, doubling embedded double quotes.
pub fn quote_ansi(parts: &[&str]) -> String {
    join_quoted(parts, '"', |_| true)
}

/// Wraps each part in backticks, doubling embedded backticks.
pub fn quote_backticks(parts: &[&str]) -> String {
    join_quoted(parts, '`', |_| true)
}

/// ANSI quoting applied only to parts that need it.
pub fn quote_required_ansi(parts: &[&str]) -> String {
    join_quoted(parts, '"', needs_quoting)
}

/// Backtick quoting applied only to parts that need it.
pub fn quote_required_backticks(parts: &[&str]) -> String {
    join_quoted(parts, '`', needs_quoting)
}

fn join_quoted(parts: &[&str], quote: char, needed: fn(&str) -> bool) -> String {
    let mut out = String::with_capacity(parts.iter().map(|p| p.len() + 3).sum());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        if needed(part) {
            write_quoted(&mut out, part, quote);
        } else {
            out.push_str(part);
        }
    }
    out
}

fn write_quoted(out: &mut String, part: &str, quote: char) {
    out.push(quote);
    for ch in part.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
}

/// A part stays bare when it is made of ASCII letters, digits, `$`, `_` or
/// characters in U+0080..=U+FFFF, and does not start with a digit.
fn needs_quoting(part: &str) -> bool {
    let mut chars = part.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if first.is_ascii_digit() || !is_bare_char(first) {
        return true;
    }
    !chars.all(is_bare_char)
}

fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '$' || c == '_' || ('\u{0080}'..='\u{FFFF}').contains(&c)
}

/// Parse a dotted identifier quoted with `quote` back into its parts.
///
/// Accepts both quoted (`"a""b"`) and bare (`users`) parts.
pub fn unquote(s: &str, quote: char) -> SqlResult<Vec<String>> {
    if s.is_empty() {
        return Ok(Vec::new());
    }

    let mut parts = Vec::new();
    let mut chars = s.chars().peekable();

    while chars.peek().is_some() {
        if !parts.is_empty() {
            match chars.next() {
                Some('.') if chars.peek().is_some() => {}
                Some('.') => return Err(SqlError::other("trailing '.' in identifier")),
                Some(c) => {
                    return Err(SqlError::other(format!(
                        "expected '.' between identifier parts, got '{c}'"
                    )));
                }
                None => break,
            }
        }

        if chars.peek() == Some(&quote) {
            chars.next();
            let mut name = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == quote => {
                        if chars.peek() == Some(&quote) {
                            chars.next();
                            name.push(quote);
                        } else {
                            break;
                        }
                    }
                    Some(c) => name.push(c),
                    None => return Err(SqlError::other("unclosed quoted identifier")),
                }
            }
            parts.push(name);
            continue;
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '.' {
                break;
            }
            name.push(c);
            chars.next();
        }
        if name.is_empty() {
            return Err(SqlError::other("empty identifier segment"));
        }
        parts.push(name);
    }

    Ok(parts)
}
