/// Escape text for embedding in a quoted string literal.
///
/// Both quote characters are escaped so the result is safe inside either
/// single- or double-quoted JavaScript and Python strings.
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Single-quoted JavaScript string literal
pub fn js_str(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}

/// Double-quoted Python string literal
pub fn py_str(value: &str) -> String {
    format!("\"{}\"", escape_literal(value))
}

/// Collapse text to one line for use in a source comment
pub fn comment_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_quotes_and_backslashes() {
        assert_eq!(escape_literal(r#"it's "x" \ y"#), r#"it\'s \"x\" \\ y"#);
        assert_eq!(js_str("a\nb"), r"'a\nb'");
        assert_eq!(py_str("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn test_comment_text_is_single_line() {
        assert_eq!(comment_text("  Sign\n   in  "), "Sign in");
    }
}
