/// Splits `line` on every `separator`. Interior empty parts (from doubled
/// separators) are kept, trailing empty parts are dropped.
pub fn split_parts(line: &str, separator: char) -> Vec<&str> {
    let mut parts: Vec<&str> = line.split(separator).collect();
    while parts.last() == Some(&"") {
        parts.pop();
    }
    parts
}

/// Wraps `s` in double quotes, escaping quotes and backslashes.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Inverse of [`quote`]. Returns `None` unless `s` starts and ends with a
/// double quote.
pub fn unquote(s: &str) -> Option<String> {
    let inner = s.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next()?);
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Renders a real for documentation: the full form or a two-decimal
/// scientific form, whichever is shorter.
pub fn real_for_doc(value: f64) -> String {
    let raw = format!("{value:?}");
    let round = format!("{value:.2E}");
    if round.len() < raw.len() {
        round
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parts_drops_trailing_empties() {
        assert_eq!(split_parts("a b c  ", ' '), vec!["a", "b", "c"]);
        assert_eq!(split_parts("a  b", ' '), vec!["a", "", "b"]);
        assert_eq!(split_parts("generate_ode_", '_'), vec!["generate", "ode"]);
    }

    #[test]
    fn test_quote_round_trip() {
        let s = r#"say "hi" \ bye"#;
        assert_eq!(unquote(&quote(s)).as_deref(), Some(s));
        assert_eq!(unquote("no quotes"), None);
        assert_eq!(unquote(r#""""#).as_deref(), Some(""));
    }

    #[test]
    fn test_real_for_doc_picks_shorter() {
        assert_eq!(real_for_doc(0.000123), "1.23E-4");
        assert_eq!(real_for_doc(0.5), "0.5");
        assert_eq!(real_for_doc(123456789.0), "1.23E8");
    }
}
