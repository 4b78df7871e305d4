//! Text escaping for hand-written XML documents.
//!
//! Summaries, names and other plain fields use standard XML escaping. Note
//! descriptions need more care: they usually carry an HTML fragment produced
//! by a rich-text editor, where `&nbsp;` entities must be normalized to
//! plain spaces, while text around the fragment (and descriptions that are
//! not HTML at all) may contain bare ampersands that have to become
//! `&amp;`. Entities XML knows how to read back are left alone either way.

use std::borrow::Cow;

/// Escape a plain text field for embedding in a document.
pub fn text(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}

/// Escape a note description for embedding in a document.
pub fn description(value: &str) -> String {
    let (start, end) = html_span(value);
    let mut out = String::with_capacity(value.len());
    escape_amps(&value[..start], &mut out);
    escape_amps(&value[start..end].replace("&nbsp;", " "), &mut out);
    escape_amps(&value[end..], &mut out);
    out.replace('<', "&lt;").replace('>', "&gt;")
}

/// The byte range of the HTML fragment inside a description, or an empty
/// range when there is none.
fn html_span(value: &str) -> (usize, usize) {
    let start = match (value.find("<html"), value.find("<body")) {
        (Some(h), Some(b)) => h.min(b),
        (Some(h), None) => h,
        (None, Some(b)) => b,
        (None, None) => return (0, 0),
    };
    let end = value
        .rfind("</body>")
        .map(|i| i + "</body>".len())
        .unwrap_or(value.len());
    (start, end.max(start))
}

/// Copy `value` into `out`, turning every ampersand that does not start an
/// XML-readable entity into `&amp;`.
fn escape_amps(value: &str, out: &mut String) {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'&' {
            let rest = &value[i..];
            if starts_xml_entity(rest) {
                out.push('&');
            } else {
                out.push_str("&amp;");
            }
        } else {
            // multi-byte characters are copied verbatim below
            out.push_str(&value[i..i + utf8_len(bytes[i])]);
        }
        i += utf8_len(bytes[i]);
    }
}

fn utf8_len(first: u8) -> usize {
    match first {
        b if b < 0x80 => 1,
        b if b < 0xE0 => 2,
        b if b < 0xF0 => 3,
        _ => 4,
    }
}

/// Whether `rest` (starting with `&`) begins one of the five predefined XML
/// entities or a numeric character reference.
fn starts_xml_entity(rest: &str) -> bool {
    for named in ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"] {
        if rest.starts_with(named) {
            return true;
        }
    }
    let body = &rest[1..];
    if let Some(digits) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return matches_until_semicolon(digits, |c| c.is_ascii_hexdigit());
    }
    if let Some(digits) = body.strip_prefix('#') {
        return matches_until_semicolon(digits, |c| c.is_ascii_digit());
    }
    false
}

fn matches_until_semicolon(s: &str, valid: impl Fn(char) -> bool) -> bool {
    let mut seen = false;
    for c in s.chars() {
        if c == ';' {
            return seen;
        }
        if !valid(c) {
            return false;
        }
        seen = true;
    }
    false
}
