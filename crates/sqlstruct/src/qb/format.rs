//! Placeholder styles.

/// How `?` placeholders are rendered in the final SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PlaceholderFormat {
    /// `?`, left as is.
    #[default]
    Question,
    /// `$1`, `$2`, ... (PostgreSQL)
    Dollar,
    /// `@p1`, `@p2`, ... (SQL Server)
    AtP,
    /// `:1`, `:2`, ... (Oracle)
    Colon,
}

impl PlaceholderFormat {
    /// Replace `?` placeholders with numbered ones; `??` renders a literal `?`.
    pub fn replace(self, sql: &str) -> String {
        let prefix = match self {
            PlaceholderFormat::Question => return sql.to_string(),
            PlaceholderFormat::Dollar => "$",
            PlaceholderFormat::AtP => "@p",
            PlaceholderFormat::Colon => ":",
        };

        let mut out = String::with_capacity(sql.len() + 8);
        let mut n = 0usize;
        let mut chars = sql.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '?' {
                out.push(ch);
                continue;
            }
            if chars.peek() == Some(&'?') {
                chars.next();
                out.push('?');
                continue;
            }
            n += 1;
            out.push_str(prefix);
            out.push_str(&n.to_string());
        }
        out
    }
}

/// Count `?` placeholders, not counting `??` escapes.
pub(crate) fn count_placeholders(sql: &str) -> usize {
    let mut n = 0;
    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '?' {
            if chars.peek() == Some(&'?') {
                chars.next();
            } else {
                n += 1;
            }
        }
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar() {
        assert_eq!(
            PlaceholderFormat::Dollar.replace("a = ? AND b IN (?,?)"),
            "a = $1 AND b IN ($2,$3)"
        );
    }

    #[test]
    fn escaped_question_mark() {
        assert_eq!(PlaceholderFormat::Dollar.replace("data ?? 'k' AND x = ?"), "data ? 'k' AND x = $1");
        assert_eq!(count_placeholders("data ?? 'k' AND x = ?"), 1);
    }

    #[test]
    fn other_formats() {
        assert_eq!(PlaceholderFormat::Question.replace("a = ?"), "a = ?");
        assert_eq!(PlaceholderFormat::AtP.replace("a = ?, b = ?"), "a = @p1, b = @p2");
        assert_eq!(PlaceholderFormat::Colon.replace("a = ?"), "a = :1");
    }
}
