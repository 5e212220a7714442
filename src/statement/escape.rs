//! MySQL literal and identifier quoting.

/// Quote a string as a MySQL single-quoted literal.
///
/// Every text, date and enum value goes through this one rule.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Quote an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Reads back a literal produced by [`quote_literal`] the way MySQL would.
#[cfg(test)]
pub(crate) fn unquote_literal(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                // a lone quote would have terminated the literal
                if chars.next()? != '\'' {
                    return None;
                }
                out.push('\'');
            }
            '\\' => match chars.next()? {
                '0' => out.push('\0'),
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                'Z' => out.push('\u{1a}'),
                other => out.push(other),
            },
            c => out.push(c),
        }
    }
    Some(out)
}
