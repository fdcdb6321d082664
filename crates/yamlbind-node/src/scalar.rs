//! Plain scalar resolution and the quoting rules used when printing.

use crate::NodeKind;

/// Resolve the type of a plain (unquoted) scalar.
pub fn resolve_plain(text: &str) -> NodeKind {
    if is_null_word(text) {
        return NodeKind::Null;
    }
    match text {
        "true" | "True" | "TRUE" => return NodeKind::Bool(true),
        "false" | "False" | "FALSE" => return NodeKind::Bool(false),
        _ => {}
    }
    if let Some(kind) = parse_int(text) {
        return kind;
    }
    if let Some(f) = parse_float(text) {
        return NodeKind::Float(f);
    }
    NodeKind::String(text.to_string())
}

fn is_null_word(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}

/// Words older parsers read as booleans; quoted on output so they stay
/// strings everywhere.
fn is_legacy_bool(text: &str) -> bool {
    matches!(
        text,
        "y" | "Y"
            | "yes"
            | "Yes"
            | "YES"
            | "n"
            | "N"
            | "no"
            | "No"
            | "NO"
            | "on"
            | "On"
            | "ON"
            | "off"
            | "Off"
            | "OFF"
    )
}

/// Parse an integer literal: decimal, `0x`, `0o`, `0b`, a leading `0` for
/// octal, and `_` digit separators.
pub fn parse_int(text: &str) -> Option<NodeKind> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if body.is_empty() || body.starts_with('_') || body.ends_with('_') {
        return None;
    }
    let (radix, digits) = if let Some(d) = body.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = body.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = body.strip_prefix("0b") {
        (2, d)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let magnitude = u64::from_str_radix(&digits, radix).ok()?;
    if negative {
        if magnitude <= i64::MAX as u64 {
            Some(NodeKind::Int(-(magnitude as i64)))
        } else if magnitude == i64::MAX as u64 + 1 {
            Some(NodeKind::Int(i64::MIN))
        } else {
            None
        }
    } else if magnitude <= i64::MAX as u64 {
        Some(NodeKind::Int(magnitude as i64))
    } else {
        Some(NodeKind::Uint(magnitude))
    }
}

/// Parse a float literal, including `.inf`, `-.inf` and `.nan`.
pub fn parse_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut prev = ' ';
    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '_' if seen_digit && !seen_exp => {}
            '.' if !seen_dot && !seen_exp => seen_dot = true,
            'e' | 'E' if seen_digit && !seen_exp => seen_exp = true,
            '-' | '+' if matches!(prev, 'e' | 'E') => {}
            _ => return None,
        }
        prev = c;
    }
    if !seen_digit || !(seen_dot || seen_exp) {
        return None;
    }
    text.replace('_', "").parse::<f64>().ok()
}

/// Render a float so it reads back as a float.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return ".nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }
    let mut s = value.to_string();
    if !s.contains(['.', 'e', 'E']) {
        s.push_str(".0");
    }
    s
}

/// `12:30:45`-like text, which sexagesimal-aware readers take as a number.
fn looks_like_time(text: &str) -> bool {
    if text.starts_with('0') || !text.contains(':') {
        return false;
    }
    text.split(':')
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Whether a string must be quoted to read back as the same string.
pub fn needs_quotes(text: &str, in_flow: bool) -> bool {
    if text.is_empty() || is_legacy_bool(text) {
        return true;
    }
    if !matches!(resolve_plain(text), NodeKind::String(_)) {
        return true;
    }
    if looks_like_time(text) || text == "<<" {
        return true;
    }
    let Some(first) = text.chars().next() else {
        return true;
    };
    if matches!(
        first,
        '*' | '&' | '[' | ']' | '{' | '}' | ',' | '!' | '|' | '>' | '%' | '\'' | '"' | '@' | '`'
            | '#'
            | ':'
    ) {
        return true;
    }
    if matches!(first, '-' | '?') {
        let second = text[1..].chars().next();
        if second.is_none_or(|c| c == ' ') {
            return true;
        }
    }
    if text.starts_with("---") || text.starts_with("...") {
        return true;
    }
    if text.starts_with(' ') || text.ends_with(' ') || text.ends_with(':') {
        return true;
    }
    if text.contains(": ") || text.contains(" #") || text.contains('#') || text.contains('\\') {
        return true;
    }
    if in_flow && text.contains([',', '[', ']', '{', '}', ':']) {
        return true;
    }
    text.chars().any(|c| c.is_control())
}

/// Double-quoted form with escapes.
pub fn double_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Single-quoted form, or `None` when the text holds characters a single
/// quoted scalar cannot carry.
pub fn single_quote(text: &str) -> Option<String> {
    if text.chars().any(|c| c.is_control()) {
        return None;
    }
    Some(format!("'{}'", text.replace('\'', "''")))
}

/// Block scalar header chosen by how the text ends.
pub fn literal_header(text: &str) -> &'static str {
    if text.ends_with("\n\n") {
        "|+"
    } else if text.ends_with('\n') {
        "|"
    } else {
        "|-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_plain() {
        assert_eq!(resolve_plain("~"), NodeKind::Null);
        assert_eq!(resolve_plain("True"), NodeKind::Bool(true));
        assert_eq!(resolve_plain("yes"), NodeKind::String("yes".into()));
        assert_eq!(resolve_plain("42"), NodeKind::Int(42));
        assert_eq!(resolve_plain("-0x1F"), NodeKind::Int(-31));
        assert_eq!(resolve_plain("0o17"), NodeKind::Int(15));
        assert_eq!(resolve_plain("0755"), NodeKind::Int(493));
        assert_eq!(resolve_plain("1_000"), NodeKind::Int(1000));
        assert_eq!(resolve_plain("18446744073709551615"), NodeKind::Uint(u64::MAX));
        assert_eq!(resolve_plain("1.5"), NodeKind::Float(1.5));
        assert_eq!(resolve_plain("1e3"), NodeKind::Float(1000.0));
        assert_eq!(resolve_plain("-.inf"), NodeKind::Float(f64::NEG_INFINITY));
        assert_eq!(resolve_plain("1.2.3"), NodeKind::String("1.2.3".into()));
        assert_eq!(resolve_plain("0x"), NodeKind::String("0x".into()));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(f64::INFINITY), ".inf");
        assert_eq!(format_float(f64::NAN), ".nan");
    }

    #[test]
    fn test_needs_quotes() {
        for s in ["", "null", "true", "yes", "Off", "42", "1.5", "0x10", ".nan", "12:30"] {
            assert!(needs_quotes(s, false), "{s:?} should be quoted");
        }
        for s in ["*a", "&a", "!tag", "- item", "key: value", "a #b", "trail:", " lead", "<<"] {
            assert!(needs_quotes(s, false), "{s:?} should be quoted");
        }
        for s in ["hello", "hello world", "a-b", "http://x.org/a", "-x", "09:30"] {
            assert!(!needs_quotes(s, false), "{s:?} should stay plain");
        }
        assert!(needs_quotes("a,b", true));
        assert!(!needs_quotes("a,b", false));
    }

    #[test]
    fn test_quoting() {
        assert_eq!(double_quote("a\"b\nc"), r#""a\"b\nc""#);
        assert_eq!(single_quote("it's").as_deref(), Some("'it''s'"));
        assert_eq!(single_quote("a\nb"), None);
    }

    #[test]
    fn test_literal_header() {
        assert_eq!(literal_header("a\nb"), "|-");
        assert_eq!(literal_header("a\nb\n"), "|");
        assert_eq!(literal_header("a\nb\n\n"), "|+");
    }
}
